//! Post API handlers.
//!
//! ```text
//! POST   /posts/               {"title":"Hello","content":"First post body","published":true}
//! GET    /posts/?skip=0&limit=10
//! GET    /posts/{id}
//! GET    /posts/user/{user_id}
//! PUT    /posts/{id}           {"title":"Renamed"}
//! DELETE /posts/{id}
//! ```
//!
//! Reads are public; writes need a bearer token and ownership.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AccountId, Error, PageRequest, PostChanges, PostDraft, PostId, PostValidationError, PostView,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::CurrentAccount;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Body for `POST /posts/`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreatePostRequest {
    #[schema(example = "Hello world")]
    pub title: String,
    #[schema(example = "A first post with enough words.")]
    pub content: String,
    /// Defaults to `true` when omitted.
    #[serde(default)]
    pub published: Option<bool>,
}

/// Body for `PUT /posts/{id}`. Omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Pagination for `GET /posts/`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    /// Number of posts to skip, newest first. Defaults to 0.
    pub skip: Option<i64>,
    /// Page size, clamped to 1..=100. Defaults to 10.
    pub limit: Option<i64>,
}

/// Post as served to clients, with its owner's username and vote count.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    #[schema(example = 7)]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[schema(example = 1)]
    pub owner_id: i64,
    #[schema(example = "alice")]
    pub owner_username: String,
    #[schema(example = 3)]
    pub votes: i64,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        let PostView {
            post,
            owner_username,
        } = view;
        Self {
            id: post.id.get(),
            title: post.title,
            content: post.content,
            published: post.published,
            created_at: post.created_at,
            owner_id: post.owner_id.get(),
            owner_username: owner_username.to_string(),
            votes: post.votes,
        }
    }
}

fn map_post_validation_error(err: PostValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

fn into_responses(views: Vec<PostView>) -> Vec<PostResponse> {
    views.into_iter().map(PostResponse::from).collect()
}

/// Publish a post owned by the caller.
#[utoipa::path(
    post,
    path = "/posts/",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid title or content", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/")]
pub async fn create_post(
    state: web::Data<HttpState>,
    current: CurrentAccount,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let CreatePostRequest {
        title,
        content,
        published,
    } = payload.into_inner();
    let draft =
        PostDraft::try_from_parts(&title, &content, published).map_err(map_post_validation_error)?;
    let view = state.posts.create(current.0.id, draft).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(view)))
}

/// List posts, newest first.
#[utoipa::path(
    get,
    path = "/posts/",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Posts", body = [PostResponse]),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "listPosts",
    security([])
)]
#[get("/")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    query: web::Query<ListPostsQuery>,
) -> ApiResult<web::Json<Vec<PostResponse>>> {
    let ListPostsQuery { skip, limit } = query.into_inner();
    let page = PageRequest::new(skip, limit).map_err(map_post_validation_error)?;
    let views = state.posts_query.list(page).await?;
    Ok(web::Json(into_responses(views)))
}

/// Fetch one post.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "No such post", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "getPost",
    security([])
)]
#[get("/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PostResponse>> {
    let view = state.posts_query.get(PostId::new(path.into_inner())).await?;
    Ok(web::Json(PostResponse::from(view)))
}

/// List every post written by one account, newest first.
#[utoipa::path(
    get,
    path = "/posts/user/{user_id}",
    params(("user_id" = i64, Path, description = "Owner account identifier")),
    responses(
        (status = 200, description = "Posts by the account", body = [PostResponse])
    ),
    tags = ["posts"],
    operation_id = "listPostsByOwner",
    security([])
)]
#[get("/user/{user_id}")]
pub async fn list_posts_by_owner(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<PostResponse>>> {
    let views = state
        .posts_query
        .list_by_owner(AccountId::new(path.into_inner()))
        .await?;
    Ok(web::Json(into_responses(views)))
}

/// Change fields of a post the caller owns.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 400, description = "Invalid title or content", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Caller does not own the post", body = ErrorSchema),
        (status = 404, description = "No such post", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "updatePost"
)]
#[put("/{id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    current: CurrentAccount,
    path: web::Path<i64>,
    payload: web::Json<UpdatePostRequest>,
) -> ApiResult<web::Json<PostResponse>> {
    let UpdatePostRequest {
        title,
        content,
        published,
    } = payload.into_inner();
    let changes = PostChanges::try_from_parts(title.as_deref(), content.as_deref(), published)
        .map_err(map_post_validation_error)?;
    let view = state
        .posts
        .update(current.0.id, PostId::new(path.into_inner()), changes)
        .await?;
    Ok(web::Json(PostResponse::from(view)))
}

/// Delete a post the caller owns, together with its votes.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Caller does not own the post", body = ErrorSchema),
        (status = 404, description = "No such post", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
#[delete("/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    current: CurrentAccount,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .posts
        .delete(current.0.id, PostId::new(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
