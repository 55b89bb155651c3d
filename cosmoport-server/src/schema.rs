//! Diesel schema definitions for Cosmoport server.

diesel::table! {
    ships (id) {
        id -> Int8,
        name -> Varchar,
        planet -> Varchar,
        ship_type -> Varchar,
        prod_date -> Timestamptz,
        is_used -> Bool,
        speed -> Float8,
        crew_size -> Int4,
        rating -> Float8,
    }
}
