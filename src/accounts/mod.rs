//! Account records shared by the credential store and the account services.

pub mod repo_types;
