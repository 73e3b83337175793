use crate::error::Result;
use crate::sentence_list::SentenceList;
use crate::user::User;
use rusqlite::{params, Connection};
use std::path::Path;

/// One persisted sentence list, sentences kept in their JSON column form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceListRow {
    pub sentences_json: String,
    pub title: String,
    pub num_completed: u32,
    pub num_correct: u32,
}

impl SentenceListRow {
    pub fn from_list(list: &SentenceList) -> Result<Self> {
        Ok(Self {
            sentences_json: list.sentences_json()?,
            title: list.title.clone(),
            num_completed: list.num_completed,
            num_correct: list.num_correct,
        })
    }

    pub fn into_list(self) -> Result<SentenceList> {
        let sentences = SentenceList::parse_sentences(&self.sentences_json)?;
        Ok(SentenceList {
            sentences,
            title: self.title,
            num_completed: self.num_completed,
            num_correct: self.num_correct,
        })
    }
}

/// Persistence boundary for the profile and the sentence lists.
///
/// There is one implicit user, so user operations take no key. Sentence lists
/// have no surrogate id: updates and deletes match on the stored sentences JSON.
pub trait Store {
    fn get_all_users(&self) -> Result<Vec<User>>;
    fn add_user(&mut self, user: &User) -> Result<()>;
    fn update_user(&mut self, user: &User) -> Result<()>;

    fn get_all_sentence_lists(&self) -> Result<Vec<SentenceListRow>>;
    fn add_sentence_list(&mut self, row: &SentenceListRow) -> Result<()>;
    fn update_sentence_list(&mut self, row: &SentenceListRow) -> Result<()>;
    fn delete_sentence_list(&mut self, sentences_json: &str) -> Result<()>;
}

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the tables exist
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                numCorrect INTEGER NOT NULL,
                defaultPath TEXT NOT NULL,
                timerDuration INTEGER NOT NULL,
                charTimerValue INTEGER NOT NULL,
                charBasedTimer BOOLEAN NOT NULL,
                noTyping BOOLEAN NOT NULL,
                autoStart BOOLEAN NOT NULL,
                showCorrectAnswer BOOLEAN NOT NULL,
                darkMode BOOLEAN NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sentenceLists (
                sentences TEXT NOT NULL,
                title TEXT NOT NULL,
                numCompleted INTEGER NOT NULL,
                numCorrect INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn get_all_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT numCorrect, defaultPath, timerDuration, charTimerValue, charBasedTimer,
                   noTyping, autoStart, showCorrectAnswer, darkMode
            FROM users
            "#,
        )?;

        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    num_correct: row.get(0)?,
                    default_path: row.get(1)?,
                    timer_duration: row.get(2)?,
                    char_timer_value: row.get(3)?,
                    char_based_timer: row.get(4)?,
                    no_typing: row.get(5)?,
                    auto_start: row.get(6)?,
                    show_correct_sentence: row.get(7)?,
                    dark_mode: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    fn add_user(&mut self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users
            (numCorrect, defaultPath, timerDuration, charTimerValue, charBasedTimer,
             noTyping, autoStart, showCorrectAnswer, darkMode)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                user.num_correct,
                user.default_path,
                user.timer_duration,
                user.char_timer_value,
                user.char_based_timer,
                user.no_typing,
                user.auto_start,
                user.show_correct_sentence,
                user.dark_mode,
            ],
        )?;
        Ok(())
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE users SET numCorrect = ?1, defaultPath = ?2, timerDuration = ?3,
                charTimerValue = ?4, charBasedTimer = ?5, noTyping = ?6, autoStart = ?7,
                showCorrectAnswer = ?8, darkMode = ?9
            "#,
            params![
                user.num_correct,
                user.default_path,
                user.timer_duration,
                user.char_timer_value,
                user.char_based_timer,
                user.no_typing,
                user.auto_start,
                user.show_correct_sentence,
                user.dark_mode,
            ],
        )?;
        Ok(())
    }

    fn get_all_sentence_lists(&self) -> Result<Vec<SentenceListRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT sentences, title, numCompleted, numCorrect FROM sentenceLists")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SentenceListRow {
                    sentences_json: row.get(0)?,
                    title: row.get(1)?,
                    num_completed: row.get(2)?,
                    num_correct: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn add_sentence_list(&mut self, row: &SentenceListRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sentenceLists (sentences, title, numCompleted, numCorrect) VALUES (?1, ?2, ?3, ?4)",
            params![row.sentences_json, row.title, row.num_completed, row.num_correct],
        )?;
        Ok(())
    }

    fn update_sentence_list(&mut self, row: &SentenceListRow) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE sentenceLists SET title = ?2, numCompleted = ?3, numCorrect = ?4
            WHERE sentences = ?1
            "#,
            params![row.sentences_json, row.title, row.num_completed, row.num_correct],
        )?;
        Ok(())
    }

    fn delete_sentence_list(&mut self, sentences_json: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM sentenceLists WHERE sentences = ?1",
            params![sentences_json],
        )?;
        Ok(())
    }
}

/// Load the profile, creating and persisting the default one on first run.
pub fn load_or_create_user<S: Store>(store: &mut S) -> Result<User> {
    if let Some(user) = store.get_all_users()?.into_iter().next() {
        return Ok(user);
    }

    let user = User::default();
    store.add_user(&user)?;
    log::info!("created default user profile");
    Ok(user)
}
