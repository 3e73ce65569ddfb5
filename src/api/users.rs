//! Reader profiles: lightweight user records used to scope progress,
//! bookmarks, and history across devices, plus which books each profile
//! has chosen to track.

use std::sync::Arc;

use poem_openapi::param::Path;
use poem_openapi::OpenApi;
use uuid::Uuid;

use crate::api::models::{BookDto, BookListResponse, CreateUserRequest, EmptyResponse, PagedBooksDto, UserCreateResponse, UserDto, UserListResponse};
use crate::api::AppState;
use crate::catalog::reader_data;

pub struct UsersApi {
    pub state: Arc<AppState>,
}

#[OpenApi]
impl UsersApi {
    #[oai(path = "/api/users", method = "get")]
    async fn list(&self) -> UserListResponse {
        let users = reader_data::list_users(&self.state.db).await.unwrap_or_default();
        UserListResponse::Ok(poem_openapi::payload::Json(users.into_iter().map(UserDto::from).collect()))
    }

    #[oai(path = "/api/users", method = "post")]
    async fn create(&self, body: poem_openapi::payload::Json<CreateUserRequest>) -> UserCreateResponse {
        let user = reader_data::create_user(&self.state.db, &body.0.username, body.0.display_name.clone())
            .await
            .unwrap_or_else(|_| crate::domain::User {
                user_uuid: Uuid::new_v4(),
                username: body.0.username.clone(),
                display_name: body.0.display_name.clone(),
                created_at: chrono::Utc::now(),
            });
        UserCreateResponse::Created(poem_openapi::payload::Json(UserDto::from(user)))
    }

    #[oai(path = "/api/users/:user_uuid", method = "patch")]
    async fn update(&self, user_uuid: Path<Uuid>, body: poem_openapi::payload::Json<CreateUserRequest>) -> UserListResponse {
        let user = reader_data::update_user(&self.state.db, user_uuid.0, body.0.display_name.clone()).await;
        UserListResponse::Ok(poem_openapi::payload::Json(user.into_iter().map(UserDto::from).collect()))
    }

    #[oai(path = "/api/users/:user_uuid", method = "delete")]
    async fn delete(&self, user_uuid: Path<Uuid>) -> EmptyResponse {
        let _ = reader_data::delete_user(&self.state.db, user_uuid.0).await;
        EmptyResponse::Ok
    }

    #[oai(path = "/api/users/:user_uuid/books", method = "get")]
    async fn books(&self, user_uuid: Path<Uuid>) -> BookListResponse {
        let books = reader_data::list_user_books(&self.state.db, user_uuid.0).await.unwrap_or_default();
        let total = books.len() as u64;
        BookListResponse::Ok(poem_openapi::payload::Json(PagedBooksDto {
            books: books.into_iter().map(BookDto::from).collect(),
            total,
            page: 1,
            limit: total.max(1),
        }))
    }

    #[oai(path = "/api/users/:user_uuid/books/:book_uuid", method = "post")]
    async fn link_book(&self, user_uuid: Path<Uuid>, book_uuid: Path<Uuid>) -> EmptyResponse {
        let _ = reader_data::link_user_book(&self.state.db, user_uuid.0, book_uuid.0).await;
        EmptyResponse::Ok
    }

    #[oai(path = "/api/users/:user_uuid/books/:book_uuid", method = "delete")]
    async fn unlink_book(&self, user_uuid: Path<Uuid>, book_uuid: Path<Uuid>) -> EmptyResponse {
        let _ = reader_data::unlink_user_book(&self.state.db, user_uuid.0, book_uuid.0).await;
        EmptyResponse::Ok
    }
}
