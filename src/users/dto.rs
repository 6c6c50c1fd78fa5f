use serde::Serialize;

use super::repo_types::UserProfile;

/// Optional profile fields. Absent or blank values leave the stored field as is.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl ProfileUpdate {
    /// Sets a field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "occupation" => &mut self.occupation,
            "bio" => &mut self.bio,
            "instagram" => &mut self.instagram,
            "facebook" => &mut self.facebook,
            "linkedin" => &mut self.linkedin,
            "github" => &mut self.github,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Overwrites only the fields that carry a non-blank value. Values are
    /// stored as sent.
    pub fn apply_to(self, profile: &mut UserProfile) {
        fn given(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }

        if let Some(v) = given(self.first_name) {
            profile.first_name = v;
        }
        if let Some(v) = given(self.last_name) {
            profile.last_name = v;
        }
        for (src, dst) in [
            (self.occupation, &mut profile.occupation),
            (self.bio, &mut profile.bio),
            (self.instagram, &mut profile.instagram),
            (self.facebook, &mut profile.facebook),
            (self.linkedin, &mut profile.linkedin),
            (self.github, &mut profile.github),
        ] {
            if let Some(v) = given(src) {
                *dst = Some(v);
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub message: String,
    pub total: usize,
    pub users: Vec<UserProfile>,
}
