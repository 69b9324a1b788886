#![allow(dead_code)]

use record_field::{Column, DataType, Database, ModelInstance, ModelMeta, RecordField, Value, record};

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Artist {
        name: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Album {
        name: String,
        artist: Artist,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct SongWithAlbum {
        name: String,
        album: Album,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct SongWithAlbumName {
        name: String,
        album_name: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct SongWithLikes {
        name: String,
        like_count: i64 = 0,
        liked_by: Vec<String> => Vec::new,
    }
}

pub const ALBUM: &str = "Ompa til du dør";
pub const ARTIST: &str = "Kaizers Orchestra";

/// An `album` model with a record column and a `song` model pointing at it.
pub fn music_db() -> anyhow::Result<Database> {
    let db = Database::new();
    db.register(ModelMeta::new(
        "album",
        vec![
            RecordField::<Artist>::new().column("artist"),
            Column::new("name", DataType::Text),
        ],
    ))?;
    db.register(ModelMeta::new(
        "song",
        vec![
            Column::foreign_key("album", "album"),
            Column::new("name", DataType::Text),
        ],
    ))?;
    Ok(db)
}

pub fn create_album(db: &Database, name: &str, artist: &str) -> anyhow::Result<ModelInstance> {
    let artist = RecordField::<Artist>::new().encode(&Artist {
        name: artist.to_string(),
    })?;
    Ok(db
        .objects("album")?
        .create(vec![("name", Value::from(name)), ("artist", artist)])?)
}

pub fn create_song(db: &Database, album: &ModelInstance, name: &str) -> anyhow::Result<ModelInstance> {
    let album_id = album.id().ok_or_else(|| anyhow::anyhow!("album has no id"))?;
    Ok(db
        .objects("song")?
        .create(vec![("album", Value::Integer(album_id)), ("name", Value::from(name))])?)
}
