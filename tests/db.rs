use diesel::prelude::*;
use proposal_crm::schema::proposal_sequence;

mod common;

#[test]
fn test_creates_and_removes_db_files() {
    let test_db = common::TestDb::new("test_in_memory_connection.db");
    let conn = test_db.pool().get();
    assert!(conn.is_ok());
}

#[test]
fn test_migrations_seed_proposal_sequence() {
    let test_db = common::TestDb::new("test_migrations_seed_sequence.db");
    let mut conn = test_db.pool().get().unwrap();
    let value = proposal_sequence::table
        .find(1)
        .select(proposal_sequence::value)
        .first::<i32>(&mut conn)
        .unwrap();
    assert_eq!(value, 1000);
}
