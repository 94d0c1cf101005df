//! Multipart payloads for creating posts and products and editing a profile.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::error::ApiError;

/// An image attached to a form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Wraps `bytes` under `file_name`, guessing the content type from the
    /// extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Overrides the guessed content type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    fn into_part(self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)
            .map_err(|e| ApiError::InvalidArgument(format!("content type {:?}: {e}", self.mime)))
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// A new post: text with an optional image.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub description: String,
    pub image: Option<Upload>,
}

impl NewPost {
    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        if self.description.trim().is_empty() && self.image.is_none() {
            return Err(ApiError::InvalidArgument(
                "a post needs a description or an image".into(),
            ));
        }
        let mut form = Form::new().text("description", self.description.trim().to_string());
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// A new product listing.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    /// Sent as typed. The backend parses it.
    pub price: Option<String>,
    pub image: Option<Upload>,
}

impl NewProduct {
    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("title", required("title", &self.title)?)
            .text("description", self.description.trim().to_string());
        if let Some(price) = self.price.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            form = form.text("price", price.to_string());
        }
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// Profile fields to change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.username.is_none() && self.bio.is_none()
    }

    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        if self.is_empty() {
            return Err(ApiError::InvalidArgument("nothing to update".into()));
        }
        let mut form = Form::new();
        if let Some(name) = self.name {
            form = form.text("name", required("name", &name)?);
        }
        if let Some(username) = self.username {
            let username = crate::extract::sanitize_username(&username)
                .ok_or_else(|| ApiError::InvalidArgument("username must not be empty".into()))?;
            form = form.text("username", username);
        }
        if let Some(bio) = self.bio {
            form = form.text("bio", bio.trim().to_string());
        }
        Ok(form)
    }
}

pub(crate) fn picture_form(picture: Upload) -> Result<Form, ApiError> {
    Ok(Form::new().part("file", picture.into_part()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("bolo.JPG"), "image/jpeg");
        assert_eq!(guess_mime("feira.png"), "image/png");
        assert_eq!(guess_mime("notes"), "application/octet-stream");
    }

    #[test]
    fn test_empty_post_is_rejected() {
        assert!(matches!(
            NewPost::default().into_form(),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_product_requires_title() {
        let product = NewProduct {
            title: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(product.into_form(), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let upload = Upload::new("a.png", vec![1, 2]).with_mime("not a mime");
        assert!(matches!(picture_form(upload), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_profile_update() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(matches!(
            ProfileUpdate::default().into_form(),
            Err(ApiError::InvalidArgument(_))
        ));
    }
}
