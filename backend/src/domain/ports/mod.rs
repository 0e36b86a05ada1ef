//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod profile_command;
mod profile_query;
mod profile_store;

#[cfg(test)]
pub use profile_command::MockProfileCommand;
pub use profile_command::{FixtureProfileCommand, ProfileCommand};
#[cfg(test)]
pub use profile_query::MockProfileQuery;
pub use profile_query::{FixtureProfileQuery, ProfileQuery};
pub use profile_store::{
    FixtureProfileStore, FixtureStoreTransaction, ProfileStore, ProfileStoreError,
    StoreTransaction, TransactionMode,
};
