use crate::error::Result;
use crate::registry::ListRegistry;
use crate::store::{load_or_create_user, Store};
use crate::timer::Countdown;
use crate::user::User;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long the correct/incorrect verdict stays up before the trainer resets.
pub const ANSWER_DISPLAY: Duration = Duration::from_secs(2);

pub const PROMPT_WELCOME: &str = "Open a text file to get started or use the default sentences.";
pub const PROMPT_GENERATE: &str = "Generate a new sentence.";
pub const PROMPT_TYPE: &str = "Type the sentence and hit Enter.";
pub const PROMPT_JUDGE: &str = "Was your answer correct or incorrect?";
pub const RESULT_CORRECT: &str = "Correct!";
pub const RESULT_INCORRECT: &str = "Incorrect!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Presenting,
    AwaitingJudgement,
    Evaluated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Mode {
    Typed,
    Judged,
}

impl Mode {
    pub fn of(user: &User) -> Self {
        if user.no_typing {
            Mode::Judged
        } else {
            Mode::Typed
        }
    }
}

/// Everything the presentation layer shows, kept as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// The sentence while it is visible, otherwise an instruction.
    pub prompt: String,
    /// "Correct!" / "Incorrect!" after an answer.
    pub result: String,
    /// The literal sentence when revealed.
    pub answer: String,
    /// Whether the reveal toggle is offered (judged mode, awaiting a verdict).
    pub reveal_available: bool,
    /// Text typed so far in typed mode.
    pub input: String,
}

/// The practice session engine.
///
/// Owns the profile, the list registry and the store; every transition is a
/// method call made from the single event loop, and timer expiry is delivered
/// through [`on_tick`](Trainer::on_tick).
#[derive(Debug)]
pub struct Trainer<S: Store> {
    store: S,
    user: User,
    registry: ListRegistry,
    phase: Phase,
    current_sentence: String,
    sentence_active: bool,
    view: View,
    response_timer: Countdown,
    answer_timer: Countdown,
    rng: StdRng,
}

impl<S: Store> Trainer<S> {
    pub fn new(store: S, user: User, registry: ListRegistry) -> Self {
        Self {
            store,
            user,
            registry,
            phase: Phase::Idle,
            current_sentence: String::new(),
            sentence_active: false,
            view: View {
                prompt: PROMPT_WELCOME.to_string(),
                ..View::default()
            },
            response_timer: Countdown::default(),
            answer_timer: Countdown::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Load the profile and lists from `store`, seeding both on first run.
    pub fn open(mut store: S, default_sentences: Option<&Path>) -> Result<Self> {
        let user = load_or_create_user(&mut store)?;
        let registry = ListRegistry::load(&mut store, default_sentences)?;
        Ok(Self::new(store, user, registry))
    }

    /// Fixed random source, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn registry(&self) -> &ListRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        Mode::of(&self.user)
    }

    pub fn sentence_active(&self) -> bool {
        self.sentence_active
    }

    pub fn current_sentence(&self) -> &str {
        &self.current_sentence
    }

    pub fn response_timer(&self) -> &Countdown {
        &self.response_timer
    }

    pub fn answer_timer(&self) -> &Countdown {
        &self.answer_timer
    }

    pub fn current_list_title(&self) -> &str {
        self.registry
            .current()
            .map(|list| list.title.as_str())
            .unwrap_or("")
    }

    pub fn list_correct(&self) -> u32 {
        self.registry
            .current()
            .map(|list| list.num_correct)
            .unwrap_or(0)
    }

    pub fn lifetime_correct(&self) -> u32 {
        self.user.num_correct
    }

    pub fn current_list_label(&self) -> String {
        format!("Current List: {}", self.current_list_title())
    }

    pub fn list_correct_label(&self) -> String {
        format!("List Correct: {}", self.list_correct())
    }

    pub fn push_input(&mut self, c: char) {
        self.view.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.view.input.pop();
    }

    /// Submit whatever has been typed into the input field.
    pub fn submit_input(&mut self) {
        let text = self.view.input.clone();
        self.submit_answer(&text);
    }

    /// Pick a sentence from the current list and show it.
    ///
    /// The pick is uniform, but it is drawn again while it equals the previous
    /// sentence, as long as the list has more than one distinct sentence.
    /// Returns false, changing nothing, when the list has nothing to show.
    pub fn generate_sentence(&mut self) -> bool {
        let Some(list) = self.registry.current() else {
            return false;
        };
        let candidates: Vec<&str> = list.practicable().into_iter().map(str::trim_end).collect();
        let Some(first) = candidates.first().copied() else {
            log::debug!("list '{}' has no sentences to present", list.title);
            return false;
        };

        let can_avoid_repeat = candidates.iter().any(|s| *s != first);
        let mut pick = first;
        loop {
            if let Some(&choice) = candidates.choose(&mut self.rng) {
                pick = choice;
            }
            if !can_avoid_repeat || pick != self.current_sentence {
                break;
            }
        }
        let sentence = pick.to_string();

        self.view.answer.clear();
        self.view.result.clear();
        self.view.reveal_available = false;
        self.answer_timer.stop();

        let duration = self.user.response_duration(&sentence);
        self.response_timer.start(Instant::now(), duration);
        self.view.prompt = sentence.clone();
        self.current_sentence = sentence;
        self.sentence_active = true;
        self.phase = Phase::Presenting;
        log::debug!("presenting sentence for {:?}", duration);
        true
    }

    /// Deliver timer expiries that are due at `now`. Returns true if any
    /// fired, meaning the view may have changed.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let response_due = self.response_timer.fire(now);
        if response_due {
            self.response_timeout();
        }
        let answer_due = self.answer_timer.fire(now);
        if answer_due {
            self.answer_timeout();
        }
        response_due || answer_due
    }

    /// Time until the earliest running timer is due, if any is running.
    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        [&self.response_timer, &self.answer_timer]
            .into_iter()
            .filter_map(|timer| timer.remaining(now))
            .min()
    }

    /// The sentence's viewing time is over: hide it. In judged mode the user
    /// is now asked for a verdict; in typed mode they can still submit.
    pub fn response_timeout(&mut self) {
        self.response_timer.stop();
        if self.phase != Phase::Presenting {
            return;
        }
        match self.mode() {
            Mode::Judged => {
                self.view.prompt = PROMPT_JUDGE.to_string();
                self.view.reveal_available = true;
                self.phase = Phase::AwaitingJudgement;
            }
            Mode::Typed => {
                self.view.prompt = PROMPT_TYPE.to_string();
            }
        }
    }

    /// Show or hide the literal sentence while awaiting a verdict.
    pub fn toggle_answer(&mut self) {
        if self.phase != Phase::AwaitingJudgement {
            return;
        }
        if self.view.answer.is_empty() {
            self.view.answer = self.current_sentence.clone();
        } else {
            self.view.answer.clear();
        }
    }

    /// Evaluate a typed answer. With no sentence active this starts one
    /// instead. Trailing whitespace is ignored on both sides; everything
    /// else must match exactly.
    pub fn submit_answer(&mut self, text: &str) {
        if !self.sentence_active {
            self.generate_sentence();
            return;
        }
        if self.mode() == Mode::Judged {
            log::debug!("ignoring typed answer in judged mode");
            return;
        }
        if text.trim().is_empty() {
            return;
        }

        let correct = text.trim_end() == self.current_sentence.trim_end();
        if self.record_outcome(correct) {
            self.complete_sentence();
        }
    }

    /// Record the user's own verdict. Only honoured while the verdict prompt
    /// is showing, so repeated clicks count once.
    pub fn judge(&mut self, is_correct: bool) {
        if self.phase != Phase::AwaitingJudgement || !self.sentence_active {
            return;
        }
        self.view.reveal_available = false;
        if self.record_outcome(is_correct) {
            self.complete_sentence();
        }
    }

    /// The verdict's display time is over.
    pub fn answer_timeout(&mut self) {
        let auto_start = self.user.auto_start;
        self.clear_answer(auto_start);
    }

    /// Reset to the neutral prompt, optionally chaining straight into the
    /// next sentence.
    pub fn clear_answer(&mut self, auto_start: bool) {
        self.view.reveal_available = false;
        self.view.result.clear();
        self.view.prompt = PROMPT_GENERATE.to_string();
        self.answer_timer.stop();
        self.phase = Phase::Idle;
        if auto_start {
            self.generate_sentence();
        }
    }

    /// Replace the profile settings. The lifetime counter is kept. Changing
    /// between typed and judged mode first abandons the sentence in flight.
    pub fn apply_settings(&mut self, settings: User) {
        let mode_changed = Mode::of(&settings) != self.mode();
        if mode_changed && self.phase != Phase::Idle {
            self.abandon_sentence();
        }
        let num_correct = self.user.num_correct;
        self.user = User {
            num_correct,
            ..settings
        };
        if mode_changed {
            log::info!("switched to {} mode", self.mode());
        }
    }

    /// Persist the current list, make list `index` current and reset the
    /// session. An out-of-range index leaves no list selected.
    pub fn switch_list(&mut self, index: usize) -> Result<()> {
        let switched = self.registry.switch_to(&mut self.store, index)?;
        if switched {
            self.abandon_sentence();
            self.current_sentence.clear();
        } else {
            self.no_lists_available();
        }
        Ok(())
    }

    /// Register sentence file contents (one per line) and switch to them.
    pub fn import_list(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.registry.import(&mut self.store, path, contents)?;
        self.abandon_sentence();
        self.current_sentence.clear();
        Ok(())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        self.import_list(path, &contents)
    }

    pub fn delete_list(&mut self, index: usize) -> Result<()> {
        let was_current = self.registry.delete(&mut self.store, index)?;
        if was_current {
            if self.registry.has_current() {
                self.abandon_sentence();
                self.current_sentence.clear();
            } else {
                self.no_lists_available();
            }
        }
        Ok(())
    }

    pub fn rename_list(&mut self, index: usize, new_title: &str) -> Result<()> {
        self.registry.rename(&mut self.store, index, new_title)
    }

    /// Persist the profile and the final current list.
    pub fn shutdown(&mut self) -> Result<()> {
        self.store.update_user(&self.user)?;
        self.registry.sync_current(&mut self.store)?;
        log::info!("saved profile ({} correct overall)", self.user.num_correct);
        Ok(())
    }

    /// Count an answer against the current list. Returns false if there is no
    /// list to count against, in which case the session degrades to the
    /// no-lists state.
    fn record_outcome(&mut self, correct: bool) -> bool {
        let Some(list) = self.registry.current_mut() else {
            self.no_lists_available();
            return false;
        };
        list.num_completed += 1;
        if correct {
            list.num_correct += 1;
            self.user.num_correct += 1;
        }
        let verdict = if correct {
            RESULT_CORRECT
        } else {
            RESULT_INCORRECT
        };
        self.view.result = verdict.to_string();
        true
    }

    fn complete_sentence(&mut self) {
        if self.user.show_correct_sentence {
            self.view.answer = self.current_sentence.clone();
        }
        self.response_timer.stop();
        self.answer_timer.start(Instant::now(), ANSWER_DISPLAY);
        self.sentence_active = false;
        self.view.input.clear();
        self.phase = Phase::Evaluated;
    }

    fn abandon_sentence(&mut self) {
        self.response_timer.stop();
        self.answer_timer.stop();
        self.sentence_active = false;
        self.view.input.clear();
        self.view.answer.clear();
        self.clear_answer(false);
    }

    fn no_lists_available(&mut self) {
        self.registry.set_no_lists();
        self.response_timer.stop();
        self.answer_timer.stop();
        self.sentence_active = false;
        self.current_sentence.clear();
        self.view = View {
            prompt: PROMPT_GENERATE.to_string(),
            ..View::default()
        };
        self.phase = Phase::Idle;
    }
}
