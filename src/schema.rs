// Diesel table definitions for courtlens. Kept in sync by hand with the
// CREATE TABLE statements in db.rs.

diesel::table! {
    courts (court_id) {
        court_id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    judges (judge_id) {
        judge_id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    charges (charge_id) {
        charge_id -> Integer,
        name -> Text,
        severity -> Nullable<Text>,
    }
}

diesel::table! {
    bail_decisions (id) {
        id -> Integer,
        court_id -> Integer,
        judge_id -> Integer,
        charge_id -> Integer,
        decision_type -> Text,
        cost -> Nullable<Double>,
        decided_at -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(courts, judges, charges, bail_decisions);
