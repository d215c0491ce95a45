use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
    sync::LazyLock,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{
    codecs::png::PngEncoder, imageops::FilterType, ColorType, ImageEncoder, ImageFormat,
};
use log::debug;
use regex::Regex;

use crate::error::{LaunchpadError, Result};

/// Edge length of the icons handed to the grid.
pub(crate) const ICON_SIZE: u32 = 128;

/// One `<key>..</key><string>..</string>` pair of an XML property list.
static PLIST_STRING_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<key>\s*([^<]*?)\s*</key>\s*<string>([^<]*)</string>").unwrap()
});

const BINARY_PLIST_MAGIC: &[u8] = b"bplist";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const ICNS_MAGIC: &[u8] = b"icns";
/// ICNS element types that may carry a PNG payload, closest to [`ICON_SIZE`] first.
const PNG_ICON_TYPES: &[&[u8; 4]] = &[
    b"ic07", b"ic13", b"ic08", b"ic12", b"ic14", b"ic09", b"ic10", b"icp6", b"ic11", b"icp5",
    b"icp4",
];

/// Contents of a bundle's `Contents/Info.plist`, in XML form.
#[derive(Debug, Clone, Default)]
pub(crate) struct BundleInfo {
    content: String,
}

impl BundleInfo {
    /// Reads the property list of `bundle`. Binary lists are converted with `plutil`.
    pub(crate) fn read(bundle: &Path) -> Option<Self> {
        let plist_path = bundle.join("Contents").join("Info.plist");
        let bytes = match fs::read(&plist_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("no readable Info.plist at {}: {err}", plist_path.display());
                return None;
            }
        };

        if bytes.starts_with(BINARY_PLIST_MAGIC) {
            return convert_binary_plist(&plist_path).map(Self::from_xml);
        }

        Some(Self::from_xml(String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub(crate) fn from_xml(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// First non-empty `<string>` value stored under `key`.
    pub(crate) fn string(&self, key: &str) -> Option<String> {
        PLIST_STRING_ENTRY
            .captures_iter(&self.content)
            .filter(|captures| &captures[1] == key)
            .map(|captures| unescape_xml(captures[2].trim()))
            .find(|value| !value.is_empty())
    }
}

fn convert_binary_plist(path: &Path) -> Option<String> {
    let output = Command::new("plutil")
        .args(["-convert", "xml1", "-o", "-"])
        .arg(path)
        .output()
        .map_err(|err| debug!("plutil unavailable for {}: {err}", path.display()))
        .ok()?;
    if !output.status.success() {
        debug!(
            "plutil could not convert {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn unescape_xml(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Finds the `.icns` file a bundle declares, or any `.icns` in its resources.
pub(crate) fn locate_icns(bundle: &Path, info: Option<&BundleInfo>) -> Option<PathBuf> {
    let resources = bundle.join("Contents").join("Resources");
    if !resources.is_dir() {
        return None;
    }

    if let Some(declared) = info.and_then(|info| info.string("CFBundleIconFile")) {
        let file_name = if declared.to_ascii_lowercase().ends_with(".icns") {
            declared
        } else {
            format!("{declared}.icns")
        };
        let candidate = resources.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let mut icns_files: Vec<PathBuf> = fs::read_dir(&resources)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("icns"))
        })
        .collect();
    icns_files.sort();
    icns_files.into_iter().next()
}

/// Renders an `.icns` file as a PNG data URL, `None` when nothing is decodable.
pub(crate) fn icns_to_data_url(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    match encode_icns(&bytes) {
        Ok(url) => Some(url),
        Err(err) => {
            debug!("skipping icon {}: {err}", path.display());
            None
        }
    }
}

pub(crate) fn encode_icns(bytes: &[u8]) -> Result<String> {
    let png = best_png_entry(bytes)
        .ok_or_else(|| LaunchpadError::Icon("no PNG element in icns container".into()))?;
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|err| LaunchpadError::Icon(err.to_string()))?;
    let rgba = decoded
        .resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(rgba.as_raw(), ICON_SIZE, ICON_SIZE, ColorType::Rgba8)
        .map_err(|err| LaunchpadError::Icon(err.to_string()))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(encoded)))
}

fn icns_elements(bytes: &[u8]) -> Vec<([u8; 4], &[u8])> {
    let mut elements = Vec::new();
    if bytes.len() < 8 || !bytes.starts_with(ICNS_MAGIC) {
        return elements;
    }

    let declared = read_be_u32(&bytes[4..8]) as usize;
    let total = declared.min(bytes.len());
    let mut offset = 8;
    while offset + 8 <= total {
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&bytes[offset..offset + 4]);
        let length = read_be_u32(&bytes[offset + 4..offset + 8]) as usize;
        if length < 8 || offset + length > total {
            break;
        }
        elements.push((kind, &bytes[offset + 8..offset + length]));
        offset += length;
    }
    elements
}

fn best_png_entry(bytes: &[u8]) -> Option<&[u8]> {
    let elements = icns_elements(bytes);
    PNG_ICON_TYPES
        .iter()
        .find_map(|wanted| {
            elements
                .iter()
                .find(|(kind, data)| kind == *wanted && data.starts_with(PNG_MAGIC))
                .map(|(_, data)| *data)
        })
        .or_else(|| {
            elements
                .iter()
                .find(|(_, data)| data.starts_with(PNG_MAGIC))
                .map(|(_, data)| *data)
        })
}

fn read_be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    pub(crate) fn sample_png(size: u32) -> Vec<u8> {
        let pixels = ImageBuffer::from_pixel(size, size, Rgba([200u8, 40, 40, 255]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(pixels.as_raw(), size, size, ColorType::Rgba8)
            .unwrap();
        png
    }

    pub(crate) fn icns_with(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let element_len = (payload.len() + 8) as u32;
        let total = element_len + 8;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(ICNS_MAGIC);
        bytes.extend_from_slice(&total.to_be_bytes());
        bytes.extend_from_slice(kind);
        bytes.extend_from_slice(&element_len.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn reads_string_values_from_xml_plist() {
        let info = BundleInfo::from_xml(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.notes</string>
    <key>CFBundleName</key>
    <string> Notes &amp; Ideas </string>
    <key>CFBundleDisplayName</key>
    <string></string>
</dict>
</plist>"#,
        );

        assert_eq!(info.string("CFBundleIdentifier").as_deref(), Some("com.example.notes"));
        assert_eq!(info.string("CFBundleName").as_deref(), Some("Notes & Ideas"));
        assert_eq!(info.string("CFBundleDisplayName"), None);
        assert_eq!(info.string("CFBundleIconFile"), None);
    }

    #[test]
    fn keys_match_exactly() {
        let info = BundleInfo::from_xml(
            "<dict><key>CFBundleNameSuffix</key><string>Beta</string>\
             <key> CFBundleName </key>\n<string>Stocks</string></dict>",
        );

        assert_eq!(info.string("CFBundleName").as_deref(), Some("Stocks"));
        assert_eq!(info.string("CFBundle"), None);
        for _ in 0..100 {
            assert_eq!(info.string("CFBundleNameSuffix").as_deref(), Some("Beta"));
        }
    }

    #[test]
    fn encodes_png_element_as_scaled_data_url() {
        let icns = icns_with(b"ic07", &sample_png(16));
        let url = encode_icns(&icns).unwrap();
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();

        let png = BASE64.decode(encoded).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), ICON_SIZE);
        assert_eq!(decoded.height(), ICON_SIZE);
    }

    #[test]
    fn rejects_containers_without_png() {
        assert!(encode_icns(b"not an icns file").is_err());
        assert!(encode_icns(&icns_with(b"is32", &[0u8; 32])).is_err());
    }

    #[test]
    fn truncated_element_stops_parsing() {
        let mut icns = icns_with(b"ic07", &sample_png(8));
        icns.truncate(icns.len() - 4);
        assert!(icns_elements(&icns).is_empty());
    }

    #[test]
    fn locates_declared_icon_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("Demo.app/Contents/Resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join("AAA.icns"), b"icns").unwrap();
        fs::write(resources.join("AppIcon.icns"), b"icns").unwrap();

        let info = BundleInfo::from_xml("<key>CFBundleIconFile</key><string>AppIcon</string>");
        let bundle = dir.path().join("Demo.app");
        assert_eq!(
            locate_icns(&bundle, Some(&info)),
            Some(resources.join("AppIcon.icns"))
        );
        assert_eq!(locate_icns(&bundle, None), Some(resources.join("AAA.icns")));
    }
}
