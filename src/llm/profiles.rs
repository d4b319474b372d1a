//! Named model profiles.

pub const GENERAL: &str = "general";
pub const REASONING: &str = "reasoning";
pub const CODE: &str = "code";

/// A named model configuration selected per call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    /// Profile name (`general`, `reasoning`, `code`)
    pub name: String,

    /// Provider model identifier (OpenRouter format)
    pub model_id: String,

    pub temperature: f32,

    /// Whether streamed completions are requested for this profile
    pub streaming: bool,

    /// Public display name; model ids are not exposed to clients
    pub display_name: String,

    pub description: String,
}

impl ModelProfile {
    fn new(name: &str, model_id: &str, display_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            model_id: model_id.to_string(),
            temperature: 0.7,
            streaming: true,
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// The immutable profile catalogue. Always contains a `general` profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfiles {
    profiles: Vec<ModelProfile>,
}

impl Default for ModelProfiles {
    fn default() -> Self {
        Self {
            profiles: vec![
                ModelProfile::new(
                    GENERAL,
                    "deepseek/deepseek-chat-v3.1",
                    "Quick Response",
                    "Fast general-purpose mode",
                ),
                ModelProfile::new(
                    REASONING,
                    "deepseek/deepseek-r1-0528",
                    "Deep Analysis",
                    "Complex reasoning mode",
                ),
                ModelProfile::new(
                    CODE,
                    "qwen/qwen-2.5-coder-32b-instruct",
                    "Code Expert",
                    "Technical mode",
                ),
            ],
        }
    }
}

impl ModelProfiles {
    /// Look up a profile by name. Unknown names resolve to `general`.
    pub fn get(&self, name: &str) -> &ModelProfile {
        self.find(name).unwrap_or_else(|| self.general())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn general(&self) -> &ModelProfile {
        // `general` is inserted by `Default` and never removed.
        self.find(GENERAL).unwrap_or(&self.profiles[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelProfile> {
        self.profiles.iter()
    }

    /// Replace the model id of an existing profile.
    pub fn with_model_id(mut self, name: &str, model_id: impl Into<String>) -> Self {
        if let Some(profile) = self.profiles.iter_mut().find(|p| p.name == name) {
            profile.model_id = model_id.into();
        }
        self
    }

    fn find(&self, name: &str) -> Option<&ModelProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_falls_back_to_general() {
        let profiles = ModelProfiles::default();
        assert_eq!(profiles.get("vision").name, GENERAL);
        assert_eq!(profiles.get("").model_id, "deepseek/deepseek-chat-v3.1");
        assert!(!profiles.contains("vision"));
    }

    #[test]
    fn test_known_profiles_resolve() {
        let profiles = ModelProfiles::default();
        assert_eq!(profiles.get(REASONING).model_id, "deepseek/deepseek-r1-0528");
        assert_eq!(profiles.get(CODE).model_id, "qwen/qwen-2.5-coder-32b-instruct");
        assert!(profiles.iter().all(|p| p.streaming));
    }

    #[test]
    fn test_with_model_id_overrides_only_named_profile() {
        let profiles = ModelProfiles::default().with_model_id(REASONING, "custom/r2");
        assert_eq!(profiles.get(REASONING).model_id, "custom/r2");
        assert_eq!(profiles.get(GENERAL).model_id, "deepseek/deepseek-chat-v3.1");

        let unchanged = ModelProfiles::default().with_model_id("vision", "custom/vl");
        assert_eq!(unchanged, ModelProfiles::default());
    }
}
