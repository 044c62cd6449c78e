pub mod assertion_cache;
pub mod key_management_service;
pub mod token_service;
