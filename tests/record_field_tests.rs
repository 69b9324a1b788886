mod common;

use common::{ALBUM, ARTIST, Album, Artist, SongWithAlbum, create_album, create_song, music_db};
use record_field::{Error, JsonObject, RecordField, Value, col};
use serde_json::json;

#[test]
fn test_create_model() -> anyhow::Result<()> {
    let db = music_db()?;
    let field = RecordField::<Artist>::new();

    let album = create_album(&db, ALBUM, ARTIST)?;
    assert!(album.id().is_some());
    assert_eq!(album.get("name"), Some(&Value::from(ALBUM)));
    assert_eq!(album.get_as("artist", &field)?.name, ARTIST);

    let album = db.objects("album")?.get()?;
    assert!(album.id().is_some());
    assert_eq!(album.get("name"), Some(&Value::from(ALBUM)));
    assert_eq!(
        album.get_as("artist", &field)?,
        Artist {
            name: ARTIST.to_string()
        }
    );
    Ok(())
}

#[test]
fn test_stored_value_is_normalised() -> anyhow::Result<()> {
    let db = music_db()?;
    let album = db.objects("album")?.create(vec![
        ("name", Value::from(ALBUM)),
        ("artist", Value::from(r#"{"name": "Kaizers Orchestra"}"#)),
    ])?;
    assert_eq!(album.get("artist"), Some(&Value::Json(json!({"name": ARTIST}))));
    Ok(())
}

#[test]
fn test_invalid_record_is_rejected_on_insert() -> anyhow::Result<()> {
    let db = music_db()?;
    let albums = db.objects("album")?;

    let err = albums
        .create(vec![
            ("name", Value::from(ALBUM)),
            ("artist", Value::Json(json!({"title": ARTIST}))),
        ])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "title"));

    let err = albums
        .create(vec![("name", Value::from(ALBUM)), ("artist", Value::Json(json!({})))])
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing field \"name\" on record \"Artist\"");

    let err = albums
        .create(vec![("name", Value::from(ALBUM)), ("artist", Value::Integer(4))])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));

    assert!(albums.create(vec![("name", Value::from(ALBUM))]).is_err());
    assert_eq!(albums.count()?, 0);
    Ok(())
}

#[test]
fn test_usage_as_annotation() -> anyhow::Result<()> {
    let db = music_db()?;
    let album = create_album(&db, ALBUM, ARTIST)?;
    create_song(&db, &album, ALBUM)?;

    let song = db
        .objects("song")?
        .values_flat(
            RecordField::<SongWithAlbum>::new().construct(
                JsonObject::new().field("name", col("name")).field(
                    "album",
                    JsonObject::new()
                        .field("name", col("album__name"))
                        .field("artist", col("album__artist")),
                ),
            )?,
        )?
        .get()?;

    assert_eq!(
        song,
        SongWithAlbum {
            name: ALBUM.to_string(),
            album: Album {
                name: ALBUM.to_string(),
                artist: Artist {
                    name: ARTIST.to_string()
                },
            },
        }
    );
    Ok(())
}

#[test]
fn test_annotation_sql() -> anyhow::Result<()> {
    let db = music_db()?;
    let songs = db.objects("song")?.values_flat(
        JsonObject::new()
            .field("name", col("album__name"))
            .field("artist", col("album__artist"))
            .output_field(RecordField::<Album>::new()),
    )?;

    let sql = songs.get_compiler().as_sql()?;
    assert!(sql.contains("JSONB_BUILD_OBJECT"));
    assert!(sql.contains("LEFT OUTER JOIN"));
    Ok(())
}

#[test]
fn test_annotation_decodes_each_row() -> anyhow::Result<()> {
    let db = music_db()?;
    let first = create_album(&db, "Maestro", ARTIST)?;
    let second = create_album(&db, "Violeta Violeta", ARTIST)?;
    create_song(&db, &first, "Knekker deg til sist")?;
    create_song(&db, &second, "Diamant til kull")?;

    let albums: Vec<Album> = db
        .objects("song")?
        .order_by(&["-name"])
        .values_flat(
            RecordField::<Album>::new().construct(
                JsonObject::new()
                    .field("name", col("album__name"))
                    .field("artist", col("album__artist")),
            )?,
        )?
        .fetch_all()?;

    let names: Vec<&str> = albums.iter().map(|album| album.name.as_str()).collect();
    assert_eq!(names, vec!["Maestro", "Violeta Violeta"]);
    assert!(albums.iter().all(|album| album.artist.name == ARTIST));
    Ok(())
}
