//! In-memory adapters for the account, post, and ballot repositories.
//!
//! [`InMemoryStore`] keeps every table behind one mutex so each repository
//! call, including [`BallotRepository::apply`], is atomic. It backs the server
//! when no database is configured and the end-to-end tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, BallotRepository, BallotRepositoryError,
    BallotTally, IdentityField, NewAccount, PostRepository, PostRepositoryError,
    StoredCredentials,
};
use crate::domain::{
    Account, AccountId, Ballot, BallotChange, Email, PageRequest, Post, PostChanges, PostDraft,
    PostId, PostView, Username,
};

#[derive(Default)]
struct Tables {
    next_account_id: i64,
    next_post_id: i64,
    accounts: BTreeMap<i64, StoredCredentials>,
    posts: BTreeMap<i64, Post>,
    ballots: BTreeMap<(i64, i64), Ballot>,
}

impl Tables {
    fn allocate_account_id(&mut self) -> i64 {
        self.next_account_id += 1;
        self.next_account_id
    }

    fn allocate_post_id(&mut self) -> i64 {
        self.next_post_id += 1;
        self.next_post_id
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let owner = self.accounts.get(&post.owner_id.get())?;
        Some(PostView {
            post: post.clone(),
            owner_username: owner.account.username.clone(),
        })
    }

    /// Posts matching `keep`, newest first.
    fn views_where(&self, keep: impl Fn(&Post) -> bool) -> Vec<PostView> {
        let mut posts: Vec<&Post> = self.posts.values().filter(|post| keep(post)).collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.get().cmp(&a.id.get()))
        });
        posts.into_iter().filter_map(|post| self.view(post)).collect()
    }

    fn count(&self, post_id: i64) -> i64 {
        let count = self
            .ballots
            .keys()
            .filter(|(ballot_post, _)| *ballot_post == post_id)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn delete_post(&mut self, post_id: i64) {
        self.posts.remove(&post_id);
        self.ballots.retain(|(ballot_post, _), _| *ballot_post != post_id);
    }
}

/// Process-local store implementing all three repository ports.
///
/// Clones share the same tables.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use upvote::outbound::memory::InMemoryStore;
///
/// let store = Arc::new(InMemoryStore::default());
/// let shared = Arc::clone(&store);
/// # let _ = shared;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl InMemoryStore {
    /// Store stamping rows with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create(&self, account: &NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut tables = self.lock().map_err(AccountRepositoryError::query)?;
        for stored in tables.accounts.values() {
            if stored.account.email == account.email {
                return Err(AccountRepositoryError::duplicate_identity(
                    IdentityField::Email,
                ));
            }
            if stored.account.username == account.username {
                return Err(AccountRepositoryError::duplicate_identity(
                    IdentityField::Username,
                ));
            }
        }
        let id = tables.allocate_account_id();
        let created = Account {
            id: AccountId::new(id),
            email: account.email.clone(),
            username: account.username.clone(),
            created_at: self.clock.utc(),
        };
        tables.accounts.insert(
            id,
            StoredCredentials {
                account: created.clone(),
                password_hash: account.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.lock().map_err(AccountRepositoryError::query)?;
        Ok(tables
            .accounts
            .get(&id.get())
            .map(|stored| stored.account.clone()))
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.lock().map_err(AccountRepositoryError::query)?;
        Ok(tables
            .accounts
            .values()
            .find(|stored| &stored.account.email == email)
            .map(|stored| stored.account.clone()))
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.lock().map_err(AccountRepositoryError::query)?;
        Ok(tables
            .accounts
            .values()
            .find(|stored| &stored.account.username == username)
            .map(|stored| stored.account.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountRepositoryError> {
        let tables = self.lock().map_err(AccountRepositoryError::query)?;
        let username = username.trim();
        Ok(tables
            .accounts
            .values()
            .find(|stored| stored.account.username.as_ref() == username)
            .cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(
        &self,
        owner_id: AccountId,
        draft: &PostDraft,
    ) -> Result<PostView, PostRepositoryError> {
        let mut tables = self.lock().map_err(PostRepositoryError::query)?;
        if !tables.accounts.contains_key(&owner_id.get()) {
            return Err(PostRepositoryError::query("foreign key constraint violated"));
        }
        let id = tables.allocate_post_id();
        let post = Post {
            id: PostId::new(id),
            title: draft.title.as_ref().to_owned(),
            content: draft.content.as_ref().to_owned(),
            published: draft.published,
            owner_id,
            created_at: self.clock.utc(),
            votes: 0,
        };
        let view = tables
            .view(&post)
            .ok_or_else(|| PostRepositoryError::query("post owner vanished"))?;
        tables.posts.insert(id, post);
        Ok(view)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<PostView>, PostRepositoryError> {
        let tables = self.lock().map_err(PostRepositoryError::query)?;
        Ok(tables.posts.get(&id.get()).and_then(|post| tables.view(post)))
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<PostView>, PostRepositoryError> {
        let tables = self.lock().map_err(PostRepositoryError::query)?;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);
        Ok(tables
            .views_where(|_| true)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn list_by_owner(
        &self,
        owner_id: AccountId,
    ) -> Result<Vec<PostView>, PostRepositoryError> {
        let tables = self.lock().map_err(PostRepositoryError::query)?;
        Ok(tables.views_where(|post| post.owner_id == owner_id))
    }

    async fn update(
        &self,
        id: PostId,
        owner_id: AccountId,
        changes: &PostChanges,
    ) -> Result<Option<PostView>, PostRepositoryError> {
        let mut tables = self.lock().map_err(PostRepositoryError::query)?;
        let Some(post) = tables
            .posts
            .get_mut(&id.get())
            .filter(|post| post.owner_id == owner_id)
        else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            post.title = title.as_ref().to_owned();
        }
        if let Some(content) = &changes.content {
            post.content = content.as_ref().to_owned();
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        let post = post.clone();
        Ok(tables.view(&post))
    }

    async fn delete(&self, id: PostId, owner_id: AccountId) -> Result<bool, PostRepositoryError> {
        let mut tables = self.lock().map_err(PostRepositoryError::query)?;
        let owned = tables
            .posts
            .get(&id.get())
            .is_some_and(|post| post.owner_id == owner_id);
        if owned {
            tables.delete_post(id.get());
        }
        Ok(owned)
    }

    async fn set_vote_count(&self, id: PostId, votes: i64) -> Result<(), PostRepositoryError> {
        let mut tables = self.lock().map_err(PostRepositoryError::query)?;
        if let Some(post) = tables.posts.get_mut(&id.get()) {
            post.votes = votes;
        }
        Ok(())
    }
}

#[async_trait]
impl BallotRepository for InMemoryStore {
    async fn create(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Ballot, BallotRepositoryError> {
        let mut tables = self.lock().map_err(BallotRepositoryError::query)?;
        if !tables.posts.contains_key(&post_id.get()) {
            return Err(BallotRepositoryError::post_missing(post_id));
        }
        let key = (post_id.get(), account_id.get());
        if tables.ballots.contains_key(&key) {
            return Err(BallotRepositoryError::already_exists(post_id, account_id));
        }
        let ballot = Ballot {
            post_id,
            account_id,
            created_at: self.clock.utc(),
        };
        tables.ballots.insert(key, ballot.clone());
        Ok(ballot)
    }

    async fn find(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Option<Ballot>, BallotRepositoryError> {
        let tables = self.lock().map_err(BallotRepositoryError::query)?;
        Ok(tables
            .ballots
            .get(&(post_id.get(), account_id.get()))
            .cloned())
    }

    async fn delete(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<bool, BallotRepositoryError> {
        let mut tables = self.lock().map_err(BallotRepositoryError::query)?;
        Ok(tables
            .ballots
            .remove(&(post_id.get(), account_id.get()))
            .is_some())
    }

    async fn count(&self, post_id: PostId) -> Result<i64, BallotRepositoryError> {
        let tables = self.lock().map_err(BallotRepositoryError::query)?;
        Ok(tables.count(post_id.get()))
    }

    async fn apply(&self, change: BallotChange) -> Result<BallotTally, BallotRepositoryError> {
        let mut tables = self.lock().map_err(BallotRepositoryError::query)?;
        let post_id = change.post_id();
        if !tables.posts.contains_key(&post_id.get()) {
            return Err(BallotRepositoryError::post_missing(post_id));
        }
        match change {
            BallotChange::Cast { account_id, .. } => {
                let key = (post_id.get(), account_id.get());
                if tables.ballots.contains_key(&key) {
                    return Err(BallotRepositoryError::already_exists(post_id, account_id));
                }
                let ballot = Ballot {
                    post_id,
                    account_id,
                    created_at: self.clock.utc(),
                };
                tables.ballots.insert(key, ballot);
            }
            BallotChange::Retract { account_id, .. } => {
                if tables
                    .ballots
                    .remove(&(post_id.get(), account_id.get()))
                    .is_none()
                {
                    return Err(BallotRepositoryError::missing(post_id, account_id));
                }
            }
        }
        let votes = tables.count(post_id.get());
        if let Some(post) = tables.posts.get_mut(&post_id.get()) {
            post.votes = votes;
        }
        Ok(BallotTally { post_id, votes })
    }
}
