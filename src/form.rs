//! Post draft state

use crate::{GeneratedImage, PreviewRegion};

/// One of the three editable text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Content,
    ImageUrl,
}

/// The draft being edited.
///
/// Text fields take any string, including the empty one. `generated` holds
/// the latest successful capture and is only ever replaced, never cleared.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    title: String,
    content: String,
    image_url: String,
    generated: Option<GeneratedImage>,
    revision: u64,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a field's value. Every call counts as an edit, even when the
    /// value is unchanged.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.title = value,
            Field::Content => self.content = value,
            Field::ImageUrl => self.image_url = value,
        }
        self.revision += 1;
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Content => &self.content,
            Field::ImageUrl => &self.image_url,
        }
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.set(Field::Title, value);
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.set(Field::Content, value);
    }

    pub fn set_image_url(&mut self, value: impl Into<String>) {
        self.set(Field::ImageUrl, value);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Number of edits applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn generated_image(&self) -> Option<&GeneratedImage> {
        self.generated.as_ref()
    }

    /// Store a new capture, dropping the previous one.
    pub fn replace_generated(&mut self, image: GeneratedImage) {
        self.generated = Some(image);
    }

    /// Snapshot the current fields as a renderable preview.
    pub fn preview(&self) -> PreviewRegion {
        PreviewRegion {
            title: self.title.clone(),
            content: self.content.clone(),
            image_url: self.image_url.clone(),
            revision: self.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageDataUri;

    fn image(tag: &str) -> GeneratedImage {
        GeneratedImage {
            data_uri: ImageDataUri::from_png(tag.as_bytes()),
            width: 1,
            height: 1,
            fingerprint: tag.to_string(),
        }
    }

    #[test]
    fn starts_empty() {
        let form = PostForm::new();
        assert_eq!(form.title(), "");
        assert_eq!(form.content(), "");
        assert_eq!(form.image_url(), "");
        assert!(form.generated_image().is_none());
        assert_eq!(form.revision(), 0);
    }

    #[test]
    fn edits_replace_values_and_bump_revision() {
        let mut form = PostForm::new();
        form.set_title("Hello");
        form.set(Field::Content, "World");
        form.set_image_url("not even a url");
        form.set_title("");
        assert_eq!(form.get(Field::Title), "");
        assert_eq!(form.get(Field::Content), "World");
        assert_eq!(form.get(Field::ImageUrl), "not even a url");
        assert_eq!(form.revision(), 4);
    }

    #[test]
    fn preview_mirrors_fields_after_every_edit() {
        let mut form = PostForm::new();
        let edits = [
            (Field::Title, "a"),
            (Field::Content, "b\nc"),
            (Field::ImageUrl, "https://x/y.png"),
            (Field::ImageUrl, ""),
            (Field::Title, "<b>&</b>"),
        ];
        for (field, value) in edits {
            form.set(field, value);
            let p = form.preview();
            assert_eq!(p.title, form.title());
            assert_eq!(p.content, form.content());
            assert_eq!(p.image_url, form.image_url());
            assert_eq!(p.revision, form.revision());
        }
    }

    #[test]
    fn generated_is_replaced_not_merged() {
        let mut form = PostForm::new();
        form.replace_generated(image("one"));
        form.replace_generated(image("two"));
        assert_eq!(form.generated_image().unwrap().fingerprint, "two");
    }
}
