//! GROQ queries for the gallery document
//!
//! The projection keeps `asset` as a raw reference (not dereferenced) so the
//! entries round-trip unchanged through reorder's full-array overwrite.

/// First gallery document in the dataset, with its ordered photo entries.
pub const FIRST_GALLERY_QUERY: &str = r#"*[_type == "gallery"][0]{
  _id,
  title,
  photos[]{
    _key,
    alt,
    caption,
    asset {
      _ref,
      _type
    }
  }
}"#;

/// Gallery by id; expects a `$galleryId` query parameter.
pub const GALLERY_BY_ID_QUERY: &str = r#"*[_id == $galleryId][0]{
  _id,
  title,
  photos[]{
    _key,
    alt,
    caption,
    asset {
      _ref,
      _type
    }
  }
}"#;
