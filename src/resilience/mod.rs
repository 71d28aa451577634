pub mod policy;

pub use policy::PersistPolicy;
