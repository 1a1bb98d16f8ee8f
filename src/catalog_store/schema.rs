//! SQLite schema definitions for the chart catalog database.
//!
//! Artists are keyed by an autoincrement id with a unique name; songs are
//! keyed by title and point at their primary artist.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTIST_TABLE: Table = Table {
    name: "Artist",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
};

const SONG_ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "Artist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const SONG_TABLE: Table = Table {
    name: "Song",
    columns: &[
        sqlite_column!("title", &SqlType::Text, is_primary_key = true),
        sqlite_column!("external_id", &SqlType::Text, non_null = true), // catalog service track id
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_ARTIST_FK)
        ),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        // Audio character, each in [0.0, 1.0]
        sqlite_column!("valence", &SqlType::Real, non_null = true),
        sqlite_column!("danceability", &SqlType::Real, non_null = true),
        sqlite_column!("energy", &SqlType::Real, non_null = true),
        sqlite_column!(
            "play_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_song_artist_id", "artist_id")],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTIST_TABLE, SONG_TABLE],
}];
