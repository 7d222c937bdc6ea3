mod archive;
mod filter;
mod moderation;
mod page;
mod post;
mod tags;
mod taxonomy;

pub use self::{
    archive::{ArchiveDay, ArchiveMonth, ArchiveYear, PostArchive, month_name},
    filter::PostFilter,
    moderation::{CommentPolicy, CommentStatus},
    page::Page,
    post::{Post, PostImage, PostImageInput, PostInput, PostRef},
    tags::{TagUsage, parse_tag_input},
    taxonomy::{Category, CategoryInput, CategoryRef, Series, SeriesInput, SeriesRef},
};

#[cfg(test)]
pub(crate) mod fixtures;
