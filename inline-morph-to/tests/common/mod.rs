//! Shared fixtures: a comment whose `commentable` may be an article or a video.

#![allow(dead_code)]

use inline_morph_to::testing::{RelationField, StaticResource, TextField};
use inline_morph_to::{FieldSet, InlineMorphTo, OperationKind, RelationKind, TypeList};

pub fn articles() -> StaticResource {
    StaticResource::new("articles", "Article")
        .with_type_path("blog::resources::Article")
        .fields(|| {
            FieldSet::new()
                .with(TextField::new("title").required())
                .with(TextField::new("body"))
        })
}

pub fn videos() -> StaticResource {
    StaticResource::new("videos", "Video")
        .with_type_path("blog::resources::VideoClip")
        .fields(|| {
            FieldSet::new()
                .with(TextField::new("url").required())
                .with(RelationField::new("comments", RelationKind::HasMany))
        })
        .fields_for(OperationKind::Index, || {
            FieldSet::new().with(TextField::new("url"))
        })
}

pub fn commentable(articles: StaticResource, videos: StaticResource) -> InlineMorphTo {
    InlineMorphTo::new("Commentable")
        .types(TypeList::unkeyed([articles.shared(), videos.shared()]))
        .expect("fixture types register")
}

pub fn default_field() -> InlineMorphTo {
    commentable(articles(), videos())
}
