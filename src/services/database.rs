// 数据库服务模块
// 提供 SQLite 数据库操作，维护用户进度状态机与难度统计计数

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::{Difficulty, ProgressRecord, ProgressStatus, UserStats};

/// 数据库服务
pub struct DatabaseService {
    pool: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl DatabaseService {
    /// 打开（或创建）指定路径的数据库
    pub fn new(db_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        let service = Self {
            pool: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_path_buf(),
        };

        service.initialize()?;
        Ok(service)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// 初始化数据库表结构
    pub fn initialize(&self) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.pool.lock().unwrap();

        // 用户进度表，(user_id, problem_id) 唯一
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                problem_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'attempted',
                attempts INTEGER NOT NULL DEFAULT 1,
                last_attempt_date TEXT NOT NULL,
                solution_code TEXT,
                UNIQUE(user_id, problem_id)
            )",
            [],
        )?;

        // 用户统计表，按难度累计首次解出数
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_stats (
                user_id INTEGER PRIMARY KEY,
                easy_solved INTEGER NOT NULL DEFAULT 0,
                medium_solved INTEGER NOT NULL DEFAULT 0,
                hard_solved INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_progress_user_id ON user_progress(user_id)",
            [],
        )?;

        Ok(())
    }

    // ==================== 进度状态机 ====================

    /// 记录一次提交尝试
    ///
    /// 不存在记录时以 attempted 建档；存在时 attempts 自增并刷新代码与时间。
    /// 已是 solved 的记录只累加 attempts，状态不回退。
    pub fn record_attempt(
        &self,
        user_id: i64,
        problem_id: i64,
        solution_code: Option<&str>,
    ) -> Result<ProgressRecord, Box<dyn std::error::Error>> {
        let now = Utc::now().to_rfc3339();

        {
            let conn = self.pool.lock().unwrap();
            conn.execute(
                "INSERT INTO user_progress
                     (user_id, problem_id, status, attempts, last_attempt_date, solution_code)
                 VALUES (?, ?, 'attempted', 1, ?, ?)
                 ON CONFLICT(user_id, problem_id) DO UPDATE SET
                     attempts = attempts + 1,
                     last_attempt_date = excluded.last_attempt_date,
                     solution_code = COALESCE(excluded.solution_code, user_progress.solution_code),
                     status = CASE WHEN user_progress.status = 'solved'
                                   THEN 'solved' ELSE 'attempted' END",
                rusqlite::params![user_id, problem_id, now, solution_code],
            )?;
        }

        debug!("Recorded attempt for user {} problem {}", user_id, problem_id);

        self.get_progress(user_id, problem_id)?
            .ok_or_else(|| "progress row missing after upsert".into())
    }

    /// 确认解出，进度置为 solved
    ///
    /// 返回是否为该 (user, problem) 首次进入 solved。首次解出时在同一事务内
    /// 累加对应难度的统计计数，重复确认不会重复累计。
    pub fn mark_solved(
        &self,
        user_id: i64,
        problem_id: i64,
        solution_code: Option<&str>,
        difficulty: Difficulty,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let now = Utc::now().to_rfc3339();

        let mut conn = self.pool.lock().unwrap();
        let tx = conn.transaction()?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT status FROM user_progress WHERE user_id = ? AND problem_id = ?",
                rusqlite::params![user_id, problem_id],
                |row| row.get(0),
            )
            .ok();

        let newly_solved = previous.as_deref() != Some("solved");

        tx.execute(
            "INSERT INTO user_progress
                 (user_id, problem_id, status, attempts, last_attempt_date, solution_code)
             VALUES (?, ?, 'solved', 1, ?, ?)
             ON CONFLICT(user_id, problem_id) DO UPDATE SET
                 status = 'solved',
                 attempts = attempts + 1,
                 last_attempt_date = excluded.last_attempt_date,
                 solution_code = COALESCE(excluded.solution_code, user_progress.solution_code)",
            rusqlite::params![user_id, problem_id, now, solution_code],
        )?;

        if newly_solved {
            let column = match difficulty {
                Difficulty::Easy => "easy_solved",
                Difficulty::Medium => "medium_solved",
                Difficulty::Hard => "hard_solved",
            };

            tx.execute(
                &format!(
                    "INSERT INTO user_stats (user_id, {column}, last_updated)
                     VALUES (?, 1, ?)
                     ON CONFLICT(user_id) DO UPDATE SET
                         {column} = {column} + 1,
                         last_updated = excluded.last_updated"
                ),
                rusqlite::params![user_id, now],
            )?;
        }

        tx.commit()?;

        debug!(
            "Marked solved for user {} problem {} (newly: {})",
            user_id, problem_id, newly_solved
        );

        Ok(newly_solved)
    }

    /// 获取单题进度
    pub fn get_progress(
        &self,
        user_id: i64,
        problem_id: i64,
    ) -> Result<Option<ProgressRecord>, Box<dyn std::error::Error>> {
        let conn = self.pool.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT user_id, problem_id, status, attempts, last_attempt_date, solution_code
             FROM user_progress WHERE user_id = ? AND problem_id = ?",
        )?;

        let mut rows = stmt.query(rusqlite::params![user_id, problem_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_progress(row)?))
        } else {
            Ok(None)
        }
    }

    /// 获取用户全部进度
    pub fn get_all_progress(
        &self,
        user_id: i64,
    ) -> Result<Vec<ProgressRecord>, Box<dyn std::error::Error>> {
        let conn = self.pool.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT user_id, problem_id, status, attempts, last_attempt_date, solution_code
             FROM user_progress WHERE user_id = ? ORDER BY problem_id",
        )?;

        let rows = stmt.query_map(rusqlite::params![user_id], |row| Self::row_to_progress(row))?;

        let mut progress = Vec::new();
        for row in rows {
            progress.push(row?);
        }

        Ok(progress)
    }

    // ==================== 统计 ====================

    /// 获取用户统计，未建档时返回全零
    pub fn get_stats(&self, user_id: i64) -> Result<UserStats, Box<dyn std::error::Error>> {
        let conn = self.pool.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT user_id, easy_solved, medium_solved, hard_solved, last_updated
             FROM user_stats WHERE user_id = ?",
        )?;

        let mut rows = stmt.query(rusqlite::params![user_id])?;

        if let Some(row) = rows.next()? {
            Ok(UserStats {
                user_id: row.get(0)?,
                easy_solved: row.get(1)?,
                medium_solved: row.get(2)?,
                hard_solved: row.get(3)?,
                last_updated: Self::parse_timestamp(4, row.get(4)?)?,
            })
        } else {
            Ok(UserStats::empty(user_id))
        }
    }

    // ==================== 行映射 ====================

    fn row_to_progress(row: &Row) -> rusqlite::Result<ProgressRecord> {
        let status_raw: String = row.get(2)?;
        let status = ProgressStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown progress status: {}", status_raw).into(),
            )
        })?;

        Ok(ProgressRecord {
            user_id: row.get(0)?,
            problem_id: row.get(1)?,
            status,
            attempts: row.get(3)?,
            last_attempt_date: Self::parse_timestamp(4, row.get(4)?)?,
            solution_code: row.get(5)?,
        })
    }

    fn parse_timestamp(index: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    index,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, DatabaseService) {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseService::new(&dir.path().join("bananaprep.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_first_attempt_creates_record() {
        let (_dir, db) = temp_db();

        let record = db.record_attempt(1, 0, Some("function y = f(x)\nend")).unwrap();

        assert_eq!(record.status, ProgressStatus::Attempted);
        assert_eq!(record.attempts, 1);
        assert_eq!(record.solution_code.as_deref(), Some("function y = f(x)\nend"));
    }

    #[test]
    fn test_repeated_attempts_increment() {
        let (_dir, db) = temp_db();

        db.record_attempt(1, 0, Some("v1")).unwrap();
        let record = db.record_attempt(1, 0, Some("v2")).unwrap();

        assert_eq!(record.status, ProgressStatus::Attempted);
        assert_eq!(record.attempts, 2);
        assert_eq!(record.solution_code.as_deref(), Some("v2"));
    }

    #[test]
    fn test_attempt_keeps_last_code_when_none() {
        let (_dir, db) = temp_db();

        db.record_attempt(1, 0, Some("kept")).unwrap();
        let record = db.record_attempt(1, 0, None).unwrap();

        assert_eq!(record.solution_code.as_deref(), Some("kept"));
    }

    #[test]
    fn test_first_solve_increments_stats_once() {
        let (_dir, db) = temp_db();

        db.record_attempt(1, 3, Some("code")).unwrap();
        let newly = db.mark_solved(1, 3, Some("code"), Difficulty::Medium).unwrap();
        assert!(newly);

        let stats = db.get_stats(1).unwrap();
        assert_eq!(stats.medium_solved, 1);
        assert_eq!(stats.easy_solved, 0);

        // 重复确认不得重复累计
        let newly = db.mark_solved(1, 3, Some("code"), Difficulty::Medium).unwrap();
        assert!(!newly);
        assert_eq!(db.get_stats(1).unwrap().medium_solved, 1);
    }

    #[test]
    fn test_solved_is_terminal() {
        let (_dir, db) = temp_db();

        db.mark_solved(1, 0, Some("code"), Difficulty::Easy).unwrap();
        let record = db.record_attempt(1, 0, Some("again")).unwrap();

        assert_eq!(record.status, ProgressStatus::Solved);
        assert_eq!(record.attempts, 2);
    }

    #[test]
    fn test_attempts_non_decreasing_across_transitions() {
        let (_dir, db) = temp_db();

        let mut last = 0;
        db.record_attempt(1, 0, None).unwrap();
        for _ in 0..3 {
            let record = db.record_attempt(1, 0, None).unwrap();
            assert!(record.attempts > last);
            last = record.attempts;
        }
        db.mark_solved(1, 0, None, Difficulty::Hard).unwrap();
        let record = db.get_progress(1, 0).unwrap().unwrap();
        assert!(record.attempts > last);
    }

    #[test]
    fn test_solve_without_prior_attempt() {
        let (_dir, db) = temp_db();

        let newly = db.mark_solved(2, 7, Some("direct"), Difficulty::Hard).unwrap();

        assert!(newly);
        let record = db.get_progress(2, 7).unwrap().unwrap();
        assert_eq!(record.status, ProgressStatus::Solved);
        assert_eq!(record.attempts, 1);
        assert_eq!(db.get_stats(2).unwrap().hard_solved, 1);
    }

    #[test]
    fn test_progress_scoped_per_user() {
        let (_dir, db) = temp_db();

        db.record_attempt(1, 0, None).unwrap();
        db.record_attempt(1, 1, None).unwrap();
        db.record_attempt(2, 0, None).unwrap();

        assert_eq!(db.get_all_progress(1).unwrap().len(), 2);
        assert_eq!(db.get_all_progress(2).unwrap().len(), 1);
        assert!(db.get_progress(3, 0).unwrap().is_none());
    }

    #[test]
    fn test_stats_default_to_zero() {
        let (_dir, db) = temp_db();

        let stats = db.get_stats(42).unwrap();

        assert_eq!(stats.easy_solved, 0);
        assert_eq!(stats.medium_solved, 0);
        assert_eq!(stats.hard_solved, 0);
    }
}
