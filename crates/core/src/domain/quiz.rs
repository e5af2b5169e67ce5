use serde::{Deserialize, Serialize};

use crate::domain::params::{BookingParameters, ParamKey};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(rename = "userPrompt")]
    pub user_prompt: String,
    #[serde(rename = "currentParams")]
    pub current_params: BookingParameters,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOption {
    pub label: String,
    pub image_url: String,
    #[serde(default)]
    pub value: String,
    /// Parameters implied by picking this image (e.g. `style_vibe`, `has_balcony`).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BookingParameters::is_empty"
    )]
    pub params: BookingParameters,
}

/// One step of the server-driven quiz: the next parameter to collect, or the
/// terminal marker carrying the final parameter set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizStep {
    #[serde(default)]
    pub quiz_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_quiz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_to_collect: Option<ParamKey>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub final_params: BookingParameters,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_options: Vec<ImageOption>,
}

impl QuizStep {
    pub fn question(key: ParamKey, prompt: impl Into<String>) -> Self {
        Self { key_to_collect: Some(key), missing_quiz: Some(prompt.into()), ..Self::default() }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.quiz_completed
    }

    pub fn key(&self) -> Option<&ParamKey> {
        self.key_to_collect.as_ref().filter(|key| !key.as_str().is_empty())
    }

    pub fn has_image_options(&self) -> bool {
        !self.image_options.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{QuizRequest, QuizStep};
    use crate::domain::params::{BookingParameters, ParamKey};

    #[test]
    fn decodes_question_with_image_options() {
        let step: QuizStep = serde_json::from_value(json!({
            "quiz_completed": false,
            "missing_quiz": "Bạn thích phong cách nào?",
            "key_to_collect": "style_vibe",
            "final_params": {"city": "Đà Nẵng"},
            "options": null,
            "image_options": [
                {"label": "Lãng mạn", "image_url": "https://img/1.jpg", "value": "romantic",
                 "params": {"has_balcony": "yes"}}
            ]
        }))
        .expect("quiz step decode");

        assert!(!step.is_terminal());
        assert_eq!(step.key(), Some(&ParamKey::Other("style_vibe".to_string())));
        assert!(step.options.is_empty());
        assert!(step.has_image_options());
        assert!(step.image_options[0].params.has_value(&ParamKey::HasBalcony));
    }

    #[test]
    fn null_parameter_maps_decode_as_empty() {
        let step: QuizStep = serde_json::from_value(json!({
            "quiz_completed": true,
            "final_params": null,
            "image_options": [
                {"label": "Yên tĩnh", "image_url": "https://img/2.jpg", "params": null}
            ]
        }))
        .expect("quiz step decode");

        assert!(step.is_terminal());
        assert!(step.final_params.is_empty());
        assert!(step.image_options[0].params.is_empty());
    }

    #[test]
    fn request_uses_camel_case_envelope() {
        let request = QuizRequest {
            user_prompt: "đi Huế".to_string(),
            current_params: BookingParameters::new().with(ParamKey::City, "Huế"),
        };
        let value = serde_json::to_value(&request).expect("encode");
        assert_eq!(value, json!({"userPrompt": "đi Huế", "currentParams": {"city": "Huế"}}));
    }
}
