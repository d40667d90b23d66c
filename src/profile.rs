//! Target profiles
//!
//! Each profile names the project template used to scaffold the target and
//! the suffix appended to its folder and assembly name.

use crate::error::InputError;

/// Describes one target profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Lookup key, matched case-insensitively
    pub key: &'static str,
    /// Name of the command-line switch selecting this profile
    pub switch: &'static str,
    /// Appended to the source project name to form the target name
    pub folder_suffix: &'static str,
    /// Prefix of the embedded `<file_name>ProjectTemplate.xml`
    pub file_name: &'static str,
    /// Human-readable description
    pub description: &'static str,
}

/// All supported profiles. The first entry is the default.
pub const PROFILES: &[TemplateDescriptor] = &[
    TemplateDescriptor {
        key: "PCL",
        switch: "pcl",
        folder_suffix: "PORTABLE",
        file_name: "PCL",
        description: "PCL (portable)",
    },
    TemplateDescriptor {
        key: "NET45",
        switch: "net45",
        folder_suffix: "NET45",
        file_name: "NET45",
        description: ".Net 4.5",
    },
    TemplateDescriptor {
        key: "NET46",
        switch: "net46",
        folder_suffix: "NET46",
        file_name: "NET46",
        description: ".Net 4.6",
    },
];

const PROJECT_TEMPLATES: &[(&str, &str)] = &[
    (
        "PCLProjectTemplate.xml",
        include_str!("../templates/PCLProjectTemplate.xml"),
    ),
    (
        "NET45ProjectTemplate.xml",
        include_str!("../templates/NET45ProjectTemplate.xml"),
    ),
    (
        "NET46ProjectTemplate.xml",
        include_str!("../templates/NET46ProjectTemplate.xml"),
    ),
];

/// Find a profile by key, ignoring case
pub fn find(key: &str) -> Option<&'static TemplateDescriptor> {
    PROFILES.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}

/// Like [`find`], but an unknown key is an error
pub fn resolve(key: &str) -> Result<&'static TemplateDescriptor, InputError> {
    find(key).ok_or_else(|| InputError::UnsupportedProfile(key.to_string()))
}

pub fn default_profile() -> &'static TemplateDescriptor {
    &PROFILES[0]
}

impl TemplateDescriptor {
    /// Resource name of this profile's project template
    pub fn template_name(&self) -> String {
        format!("{}ProjectTemplate.xml", self.file_name)
    }

    /// The embedded project template, if one is bundled under [`Self::template_name`]
    pub fn project_template(&self) -> Option<&'static str> {
        let name = self.template_name();
        PROJECT_TEMPLATES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, content)| *content)
    }
}
