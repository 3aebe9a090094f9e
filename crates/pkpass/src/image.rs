//! Image asset naming.
//!
//! Images live at `<kind><scale>.png` in the archive root, or under
//! `<code>.lproj/` when localized, e.g. `en.lproj/strip@2x.png`.

use crate::localization::Localization;
use crate::pass::PassStyle;
use std::fmt;

/// The role of an image on the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageKind {
    Icon,
    Logo,
    Thumbnail,
    Strip,
    Background,
    Footer,
    /// Shown on the rewards signup sheet of a personalizable pass.
    PersonalizationLogo,
}

impl ImageKind {
    pub const ALL: [ImageKind; 7] = [
        ImageKind::Icon,
        ImageKind::Logo,
        ImageKind::Thumbnail,
        ImageKind::Strip,
        ImageKind::Background,
        ImageKind::Footer,
        ImageKind::PersonalizationLogo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ImageKind::Icon => "icon",
            ImageKind::Logo => "logo",
            ImageKind::Thumbnail => "thumbnail",
            ImageKind::Strip => "strip",
            ImageKind::Background => "background",
            ImageKind::Footer => "footer",
            ImageKind::PersonalizationLogo => "personalizationLogo",
        }
    }

    /// Nominal size in points at 1x. The strip area depends on the style.
    pub fn point_size(self, style: PassStyle) -> (u32, u32) {
        match self {
            ImageKind::Icon => (29, 29),
            ImageKind::Logo => (160, 50),
            ImageKind::Thumbnail => (90, 90),
            ImageKind::Strip => match style {
                PassStyle::EventTicket => (375, 98),
                PassStyle::Coupon => (375, 144),
                PassStyle::StoreCard | PassStyle::BoardingPass | PassStyle::Generic => (375, 123),
            },
            ImageKind::Background => (180, 220),
            ImageKind::Footer => (286, 15),
            ImageKind::PersonalizationLogo => (150, 40),
        }
    }
}

/// Pixel density of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Scale {
    #[default]
    X1,
    X2,
    X3,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::X1, Scale::X2, Scale::X3];

    /// File name suffix: empty, `@2x` or `@3x`.
    pub fn suffix(self) -> &'static str {
        match self {
            Scale::X1 => "",
            Scale::X2 => "@2x",
            Scale::X3 => "@3x",
        }
    }

    pub fn factor(self) -> u32 {
        match self {
            Scale::X1 => 1,
            Scale::X2 => 2,
            Scale::X3 => 3,
        }
    }
}

/// An image slot: kind plus scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Image {
    pub kind: ImageKind,
    pub scale: Scale,
}

impl Image {
    pub const fn new(kind: ImageKind, scale: Scale) -> Self {
        Self { kind, scale }
    }

    pub const fn icon(scale: Scale) -> Self {
        Self::new(ImageKind::Icon, scale)
    }

    pub const fn logo(scale: Scale) -> Self {
        Self::new(ImageKind::Logo, scale)
    }

    pub const fn thumbnail(scale: Scale) -> Self {
        Self::new(ImageKind::Thumbnail, scale)
    }

    pub const fn strip(scale: Scale) -> Self {
        Self::new(ImageKind::Strip, scale)
    }

    pub const fn background(scale: Scale) -> Self {
        Self::new(ImageKind::Background, scale)
    }

    pub const fn footer(scale: Scale) -> Self {
        Self::new(ImageKind::Footer, scale)
    }

    pub const fn personalization_logo(scale: Scale) -> Self {
        Self::new(ImageKind::PersonalizationLogo, scale)
    }

    /// `icon@2x.png` and the like.
    pub fn filename(&self) -> String {
        format!("{}{}.png", self.kind.name(), self.scale.suffix())
    }

    /// Archive path, prefixed with the localization directory if given.
    pub fn path(&self, locale: Option<&str>) -> String {
        match locale {
            Some(code) => format!("{}/{}", Localization::directory(code), self.filename()),
            None => self.filename(),
        }
    }

    /// Recognizes a file name produced by [`Image::filename`].
    pub fn from_filename(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".png")?;
        let (base, scale) = if let Some(base) = stem.strip_suffix("@3x") {
            (base, Scale::X3)
        } else if let Some(base) = stem.strip_suffix("@2x") {
            (base, Scale::X2)
        } else {
            (stem, Scale::X1)
        };
        let kind = ImageKind::ALL.into_iter().find(|k| k.name() == base)?;
        Some(Self::new(kind, scale))
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames() {
        assert_eq!(Image::icon(Scale::X1).filename(), "icon.png");
        assert_eq!(Image::strip(Scale::X2).filename(), "strip@2x.png");
        assert_eq!(Image::footer(Scale::X3).filename(), "footer@3x.png");
        assert_eq!(
            Image::personalization_logo(Scale::X2).filename(),
            "personalizationLogo@2x.png"
        );
    }

    #[test]
    fn test_localized_path() {
        assert_eq!(Image::strip(Scale::X2).path(Some("en")), "en.lproj/strip@2x.png");
        assert_eq!(Image::background(Scale::X1).path(None), "background.png");
    }

    #[test]
    fn test_from_filename_round_trip() {
        for kind in ImageKind::ALL {
            for scale in Scale::ALL {
                let image = Image::new(kind, scale);
                assert_eq!(Image::from_filename(&image.filename()), Some(image));
            }
        }
        assert_eq!(Image::from_filename("pass.json"), None);
        assert_eq!(Image::from_filename("banner@2x.png"), None);
        assert_eq!(
            Image::from_filename("personalizationLogo@3x.png"),
            Some(Image::personalization_logo(Scale::X3))
        );
    }

    #[test]
    fn test_strip_size_depends_on_style() {
        assert_eq!(ImageKind::Strip.point_size(PassStyle::EventTicket), (375, 98));
        assert_eq!(ImageKind::Strip.point_size(PassStyle::Coupon), (375, 144));
        assert_eq!(ImageKind::Icon.point_size(PassStyle::Generic), (29, 29));
    }
}
