mod member;

pub use member::InMemoryMemberRegistry;
