//! Integration tests for the lading binary

mod helpers;
mod test_bump;
mod test_publish;
