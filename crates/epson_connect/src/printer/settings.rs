//! Print settings: defaults, merging, and the cross-field rules the service
//! enforces on job creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    Document,
    Photo,
}

impl PrintMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PrintMode::Document => "document",
            PrintMode::Photo => "photo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSize {
    #[serde(rename = "ms_a3")]
    A3,
    #[serde(rename = "ms_a4")]
    A4,
    #[serde(rename = "ms_a5")]
    A5,
    #[serde(rename = "ms_a6")]
    A6,
    #[serde(rename = "ms_b5")]
    B5,
    #[serde(rename = "ms_tabloid")]
    Tabloid,
    #[serde(rename = "ms_letter")]
    Letter,
    #[serde(rename = "ms_legal")]
    Legal,
    #[serde(rename = "ms_halfletter")]
    HalfLetter,
    #[serde(rename = "ms_kg")]
    Kg,
    #[serde(rename = "ms_l")]
    L,
    #[serde(rename = "ms_2l")]
    TwoL,
    #[serde(rename = "ms_10x12")]
    TenByTwelve,
    #[serde(rename = "ms_8x10")]
    EightByTen,
    #[serde(rename = "ms_hivision")]
    HiVision,
    #[serde(rename = "ms_5x8")]
    FiveByEight,
    #[serde(rename = "ms_postcard")]
    Postcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "mt_plainpaper")]
    PlainPaper,
    #[serde(rename = "mt_photopaper")]
    PhotoPaper,
    #[serde(rename = "mt_hagaki")]
    Hagaki,
    #[serde(rename = "mt_hagakiphoto")]
    HagakiPhoto,
    #[serde(rename = "mt_hagakiinkjet")]
    HagakiInkjet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintQuality {
    High,
    Normal,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSource {
    Auto,
    Rear,
    Front1,
    Front2,
    Front3,
    Front4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Color,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwoSided {
    None,
    Long,
    Short,
}

/// Per-job media settings as supplied by the caller. Anything left `None`
/// takes the service default during merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrintSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_size: Option<MediaSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borderless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_quality: Option<PrintQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PaperSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_sided: Option<TwoSided>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_order: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collate: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrintSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_mode: Option<PrintMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_setting: Option<PrintSetting>,
}

/// Fully populated settings as submitted on job creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrintSettings {
    pub job_name: String,
    pub print_mode: PrintMode,
    pub print_setting: ResolvedPrintSetting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrintSetting {
    pub media_size: MediaSize,
    pub media_type: MediaType,
    pub borderless: bool,
    pub print_quality: PrintQuality,
    pub source: PaperSource,
    pub color_mode: ColorMode,
    pub two_sided: TwoSided,
    pub reverse_order: bool,
    pub copies: u32,
    pub collate: bool,
}

fn generated_job_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("job-{}", &id[..8])
}

pub fn merge_with_defaults(settings: &PrintSettings) -> ResolvedPrintSettings {
    let setting = settings.print_setting.clone().unwrap_or_default();
    ResolvedPrintSettings {
        job_name: settings.job_name.clone().unwrap_or_else(generated_job_name),
        print_mode: settings.print_mode.unwrap_or(PrintMode::Document),
        print_setting: ResolvedPrintSetting {
            media_size: setting.media_size.unwrap_or(MediaSize::A4),
            media_type: setting.media_type.unwrap_or(MediaType::PlainPaper),
            borderless: setting.borderless.unwrap_or(false),
            print_quality: setting.print_quality.unwrap_or(PrintQuality::Normal),
            source: setting.source.unwrap_or(PaperSource::Auto),
            color_mode: setting.color_mode.unwrap_or(ColorMode::Color),
            two_sided: setting.two_sided.unwrap_or(TwoSided::None),
            reverse_order: setting.reverse_order.unwrap_or(false),
            copies: setting.copies.unwrap_or(1),
            collate: setting.collate.unwrap_or(true),
        },
    }
}

pub fn validate_settings(settings: &ResolvedPrintSettings) -> Result<()> {
    if settings.job_name.chars().count() > 256 {
        return Err(Error::PrintSetting(format!(
            "job name is greater than 256 chars: {}",
            settings.job_name
        )));
    }

    let setting = &settings.print_setting;
    let two_sided = matches!(setting.two_sided, TwoSided::Long | TwoSided::Short);

    if two_sided && setting.reverse_order {
        return Err(Error::PrintSetting(
            "can not use reverse order when using two-sided printing".to_string(),
        ));
    }
    if two_sided && !setting.collate {
        return Err(Error::PrintSetting(
            "must collate when using two-sided printing".to_string(),
        ));
    }
    if !(1..=99).contains(&setting.copies) {
        return Err(Error::PrintSetting(format!(
            "invalid number of copies {}",
            setting.copies
        )));
    }
    Ok(())
}
