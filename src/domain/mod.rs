pub mod item;
pub mod options;
pub mod profile;
pub mod source;

pub use item::Item;
pub use options::{
    GithubMode, GithubOptions, GoogleNewsOptions, GoogleNewsQuery, PlatformOptions, SourceOptions,
    StackOverflowOptions, StackOverflowQuery,
};
pub use profile::{GithubAccount, Profile};
pub use source::{Normalized, Source, SourceMeta, SourceType};
