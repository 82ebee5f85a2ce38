//! Posts, their validated fields, and the read model served to clients.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{AccountId, Username};

/// Minimum title length in characters, after trimming.
pub const TITLE_MIN: usize = 3;
/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Minimum content length in characters, after trimming.
pub const CONTENT_MIN: usize = 10;
/// Page size used when a listing omits `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
/// Largest page a single listing may return.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Validation errors for post fields and listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    #[error("title must be at least {min} characters")]
    TitleTooShort { min: usize },
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("content must be at least {min} characters")]
    ContentTooShort { min: usize },
    #[error("skip must not be negative")]
    NegativeSkip,
}

impl PostValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::TitleTooShort { .. } | Self::TitleTooLong { .. } => "title",
            Self::ContentTooShort { .. } => "content",
            Self::NegativeSkip => "skip",
        }
    }

    /// Machine-readable validation code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TitleTooShort { .. } => "title_too_short",
            Self::TitleTooLong { .. } => "title_too_long",
            Self::ContentTooShort { .. } => "content_too_short",
            Self::NegativeSkip => "negative_skip",
        }
    }
}

/// Database-assigned post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(i64);

impl PostId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Post title, trimmed, between [`TITLE_MIN`] and [`TITLE_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PostValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < TITLE_MIN {
            return Err(PostValidationError::TitleTooShort { min: TITLE_MIN });
        }
        if length > TITLE_MAX {
            return Err(PostValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Post body, trimmed, at least [`CONTENT_MIN`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PostValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < CONTENT_MIN {
            return Err(PostValidationError::ContentTooShort { min: CONTENT_MIN });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PostContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated input for a new post.
///
/// # Examples
/// ```
/// use upvote::domain::PostDraft;
///
/// let draft = PostDraft::try_from_parts("Hello", "A first post body.", None).expect("valid");
/// assert!(draft.published);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: PostTitle,
    pub content: PostContent,
    pub published: bool,
}

impl PostDraft {
    /// Validate raw inputs; `published` defaults to `true`.
    pub fn try_from_parts(
        title: &str,
        content: &str,
        published: Option<bool>,
    ) -> Result<Self, PostValidationError> {
        Ok(Self {
            title: PostTitle::new(title)?,
            content: PostContent::new(content)?,
            published: published.unwrap_or(true),
        })
    }
}

/// Partial update of a post. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<PostTitle>,
    pub content: Option<PostContent>,
    pub published: Option<bool>,
}

impl PostChanges {
    /// Validate whichever fields are present.
    pub fn try_from_parts(
        title: Option<&str>,
        content: Option<&str>,
        published: Option<bool>,
    ) -> Result<Self, PostValidationError> {
        Ok(Self {
            title: title.map(PostTitle::new).transpose()?,
            content: content.map(PostContent::new).transpose()?,
            published,
        })
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published.is_none()
    }
}

/// Persisted post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub owner_id: AccountId,
    pub created_at: DateTime<Utc>,
    /// Denormalised ballot count, kept equal to the number of ballots on
    /// this post after every ballot mutation.
    pub votes: i64,
}

/// Read model returned by listings and lookups: the post plus the owner's
/// username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub owner_username: Username,
}

impl PostView {
    pub fn id(&self) -> PostId {
        self.post.id
    }

    pub fn owner_id(&self) -> AccountId {
        self.post.owner_id
    }

    pub fn votes(&self) -> i64 {
        self.post.votes
    }
}

/// Offset pagination for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: i64,
    limit: i64,
}

impl PageRequest {
    /// Build a page from optional `skip`/`limit` query values.
    ///
    /// `skip` defaults to 0 and must not be negative. `limit` defaults to
    /// [`DEFAULT_PAGE_LIMIT`] and is clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Result<Self, PostValidationError> {
        let offset = skip.unwrap_or(0);
        if offset < 0 {
            return Err(PostValidationError::NegativeSkip);
        }
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        Ok(Self { offset, limit })
    }

    pub fn offset(self) -> i64 {
        self.offset
    }

    pub fn limit(self) -> i64 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}
