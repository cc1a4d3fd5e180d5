//! Who is signed in.
//!
//! A [`Session`] is acquired with [`Session::sign_in`], rebuilt on later runs
//! with [`Session::resume`], and ended with [`Session::sign_out`], which
//! consumes it. Anything that needs identity or the user's location takes a
//! `&Session` explicitly.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::repository::MetaRepo;
use crate::models::Profile;

const USER_KEY: &str = "session_user";
const SIGNED_IN_AT_KEY: &str = "session_signed_in_at";

#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub profile: Profile,
    pub signed_in_at: DateTime<Local>,
}

impl Session {
    pub fn sign_in(conn: &Connection, config: &AppConfig, user: &str) -> Result<Session> {
        let user = user.trim();
        if user.is_empty() {
            bail!("User name must not be empty");
        }
        let signed_in_at = Local::now();
        MetaRepo::set(conn, USER_KEY, user)?;
        MetaRepo::set(conn, SIGNED_IN_AT_KEY, &signed_in_at.to_rfc3339())?;
        log::info!("signed in as {}", user);

        Ok(Session {
            user: user.to_string(),
            profile: config.profile.to_profile(),
            signed_in_at,
        })
    }

    /// The session left by an earlier `sign_in`, if it is still open.
    /// The profile always comes from the current config.
    pub fn resume(conn: &Connection, config: &AppConfig) -> Result<Option<Session>> {
        let Some(user) = MetaRepo::get(conn, USER_KEY)? else {
            return Ok(None);
        };
        let signed_in_at = match MetaRepo::get(conn, SIGNED_IN_AT_KEY)? {
            Some(s) => DateTime::parse_from_rfc3339(&s)
                .with_context(|| format!("Bad session timestamp '{}'", s))?
                .with_timezone(&Local),
            None => Local::now(),
        };

        Ok(Some(Session {
            user,
            profile: config.profile.to_profile(),
            signed_in_at,
        }))
    }

    /// Like [`resume`](Self::resume) but an absent session is an error.
    pub fn require(conn: &Connection, config: &AppConfig) -> Result<Session> {
        Self::resume(conn, config)?
            .context("Not signed in. Run `waqt signin <name>` first.")
    }

    pub fn sign_out(self, conn: &Connection) -> Result<()> {
        MetaRepo::delete(conn, USER_KEY)?;
        MetaRepo::delete(conn, SIGNED_IN_AT_KEY)?;
        log::info!("signed out {}", self.user);
        Ok(())
    }
}
