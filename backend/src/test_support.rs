//! Shared fixtures for unit tests inside the crate.

use std::sync::Arc;

use argon2::Params;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Account, AccountId, CredentialService, Email, Post, PostId, PostView, TokenAlgorithm,
    TokenSettings, Username,
};

/// Clock frozen at a fixed instant.
pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("fixture timestamp is unambiguous")
}

/// Argon2 parameters cheap enough for unit tests.
pub(crate) fn light_hash_params() -> Params {
    Params::new(8, 1, 1, None).expect("minimal argon2 params are valid")
}

/// Credential service signing with a fixed key, frozen at [`fixture_now`].
pub(crate) fn credential_service() -> CredentialService {
    let settings = TokenSettings::new(vec![b'k'; 32], TokenAlgorithm::Hs256, 30)
        .expect("valid token settings");
    CredentialService::with_hash_params(
        settings,
        Arc::new(FixtureClock {
            utc_now: fixture_now(),
        }),
        light_hash_params(),
    )
}

pub(crate) fn account(id: i64, username: &str) -> Account {
    Account {
        id: AccountId::new(id),
        email: Email::new(format!("{username}@example.com")).expect("fixture email"),
        username: Username::new(username).expect("fixture username"),
        created_at: fixture_now(),
    }
}

pub(crate) fn post_view(id: i64, owner: &Account, votes: i64) -> PostView {
    PostView {
        post: Post {
            id: PostId::new(id),
            title: format!("Post {id}"),
            content: "Fixture post content".to_owned(),
            published: true,
            owner_id: owner.id,
            created_at: fixture_now(),
            votes,
        },
        owner_username: owner.username.clone(),
    }
}
