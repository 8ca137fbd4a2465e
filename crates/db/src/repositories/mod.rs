//! Repositories.
//!
//! Thin, cloneable wrappers around the shared connection. Each one owns the
//! queries for a single aggregate.

mod category;
mod comment;
mod genre;
mod review;
mod title;
mod user;

pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use genre::GenreRepository;
pub use review::ReviewRepository;
pub use title::{TitleFilter, TitleRepository};
pub use user::UserRepository;

use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

/// Case-insensitive substring match, with `LIKE` wildcards in the needle escaped.
pub(crate) fn icontains<C: ColumnTrait + 'static>(column: C, needle: &str) -> SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{escaped}%"))
}
