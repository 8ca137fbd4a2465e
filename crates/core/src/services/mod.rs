//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod category;
pub mod comment;
pub mod confirmation;
pub mod email;
pub mod genre;
pub mod permission;
pub mod review;
pub mod title;
pub mod token;
pub mod user;

pub use account::{AccountService, SignupInput, TokenInput};
pub use category::{CategoryService, CreateCategoryInput};
pub use comment::{CommentService, CommentWithAuthor, CreateCommentInput, UpdateCommentInput};
pub use confirmation::ConfirmationCodes;
pub use email::{
    EmailMessage, EmailService, LogTransport, MailTransport, Mailer, MemoryTransport,
    SmtpTransport, confirmation_code_from, transport_from_config,
};
pub use genre::{CreateGenreInput, GenreService};
pub use permission::{Action, Policy, allow};
pub use review::{CreateReviewInput, ReviewService, ReviewWithAuthor, UpdateReviewInput};
pub use title::{CreateTitleInput, TitleDetails, TitleService, UpdateTitleInput};
pub use token::{Claims, TokenService};
pub use user::{CreateUserInput, UpdateUserInput, UserService};

/// One page of a list query, with the total row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
}
