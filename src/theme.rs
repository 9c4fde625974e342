use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub font_family: String,
    pub caption_font_size: f32,
    pub text_color: String,
    pub box_fill: String,
    pub box_stroke: String,
    pub edge_color: String,
    pub background: String,
}

impl Theme {
    /// Teal boxes on white with Tahoma text.
    pub fn classic() -> Self {
        Self {
            font_family: "Tahoma".to_string(),
            caption_font_size: 16.0,
            text_color: "#363634".to_string(),
            box_fill: "#C2E7EF".to_string(),
            box_stroke: "#CEE2E9".to_string(),
            edge_color: "#545451".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
