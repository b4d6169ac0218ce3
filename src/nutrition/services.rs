use std::time::Duration;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::{
    errors::{ClassifiedError, ValidationError},
    inference::{sniff_mime, AdapterFailure, FoodAnalyzer, ImageInput},
    nutrition::{
        dto::{ScanRequest, ScanResponse},
        types::ScanResult,
    },
};

pub const IMAGE_FIELD: &str = "image_base64";

/// Standard alphabet; trailing `=` padding optional.
const IMAGE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub max_image_bytes: usize,
    pub timeout: Duration,
}

/// A request that passed validation; only this reaches the analyzer.
#[derive(Debug)]
pub struct ValidatedScan {
    pub image: ImageInput,
    pub description: Option<String>,
}

fn strip_data_url(raw: &str) -> &str {
    lazy_static! {
        static ref DATA_URL_RE: Regex = Regex::new(r"^data:[^,;]*(;[^,;]+)*;base64,").unwrap();
    }
    match DATA_URL_RE.find(raw) {
        Some(m) => &raw[m.end()..],
        None => raw,
    }
}

pub fn validate(req: ScanRequest, max_image_bytes: usize) -> Result<ValidatedScan, ValidationError> {
    let raw = req.image_base64.unwrap_or_default();
    let payload: String = strip_data_url(raw.trim())
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if payload.is_empty() {
        return Err(ValidationError::new("image_base64 is required", IMAGE_FIELD));
    }

    let bytes = IMAGE_ENGINE
        .decode(payload.as_bytes())
        .map_err(|_| ValidationError::new("image_base64 is not valid base64", IMAGE_FIELD).redacted())?;

    if bytes.is_empty() {
        return Err(ValidationError::new("image_base64 decodes to an empty image", IMAGE_FIELD).redacted());
    }
    if bytes.len() > max_image_bytes {
        return Err(ValidationError::new(
            format!("image too large, max size is {} bytes", max_image_bytes),
            IMAGE_FIELD,
        )
        .redacted());
    }

    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(ValidatedScan {
        image: ImageInput {
            mime_type: sniff_mime(&bytes),
            bytes: Bytes::from(bytes),
        },
        description,
    })
}

/// Turns a structurally successful analysis into either a usable result or a classified error.
fn interpret(mut result: ScanResult) -> Result<ScanResult, ClassifiedError> {
    if !result.is_food {
        info!(detected_object = %result.detected_object, "image is not food");
        return Err(ClassifiedError::not_food(&result.detected_object));
    }
    let Some(macros) = result.macros else {
        error!(food_name = %result.food_name, "food result without macros");
        return Err(AdapterFailure::Malformed("is_food without macros".into()).into());
    };

    let before = result.ingredients.len();
    result.ingredients.retain_mut(|i| {
        i.name = i.name.trim().to_string();
        !i.name.is_empty()
    });
    if result.ingredients.len() != before {
        warn!(
            dropped = before - result.ingredients.len(),
            "ignoring unnamed ingredients"
        );
    }

    let totals = result.ingredient_totals();
    debug!(
        calories = macros.calories,
        ingredient_calories = totals.calories,
        ingredients = result.ingredients.len(),
        "scan macros"
    );
    Ok(result)
}

/// One scan: validate, single analyzer call under a deadline, classify, project.
pub async fn scan_food(
    analyzer: &dyn FoodAnalyzer,
    req: ScanRequest,
    limits: ScanLimits,
) -> Result<ScanResponse, ClassifiedError> {
    let scan = validate(req, limits.max_image_bytes).map_err(|e| {
        warn!(error = %e, "scan request invalid");
        ClassifiedError::from(e)
    })?;

    info!(
        image_size_bytes = scan.image.bytes.len(),
        mime_type = scan.image.mime_type,
        description = ?scan.description,
        provider = analyzer.provider_name(),
        "received food scan request"
    );

    let outcome = tokio::time::timeout(
        limits.timeout,
        analyzer.analyze(scan.image, scan.description.as_deref()),
    )
    .await
    .unwrap_or(Err(AdapterFailure::Cancelled));

    let result = match outcome {
        Ok(result) => result,
        Err(failure) => {
            error!(error = %failure, provider = analyzer.provider_name(), "food analysis failed");
            return Err(failure.into());
        }
    };

    let result = interpret(result)?;
    Ok(ScanResponse::from(result))
}
