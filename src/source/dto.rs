use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlayUrlResp {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<PlayUrlData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayUrlData {
    pub dash: Option<Dash>,
    #[serde(default)]
    pub durl: Vec<Durl>,
}

#[derive(Debug, Deserialize)]
pub struct Dash {
    #[serde(default)]
    pub audio: Option<Vec<DashAudio>>,
}

// The endpoint sends both camelCase and snake_case spellings of the same
// fields, so they are kept apart instead of aliased.
#[derive(Debug, Deserialize)]
pub struct DashAudio {
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(rename = "baseUrl", default)]
    pub base_url_camel: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(rename = "backupUrl", default)]
    pub backup_url_camel: Option<Vec<String>>,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}

impl DashAudio {
    pub fn primary(&self) -> Option<&str> {
        self.base_url_camel
            .as_deref()
            .or(self.base_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn backups(&self) -> Vec<String> {
        self.backup_url_camel
            .clone()
            .or_else(|| self.backup_url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct Durl {
    pub url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}
