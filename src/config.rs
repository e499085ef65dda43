/// Marker classes shared between the engine and the markup it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix of the class identifying a component’s node; followed by the component id.
    pub view_class_prefix: String,
    /// Class on nodes of visible components.
    pub visible_class: String,
    /// Class on nodes of hidden components.
    pub hidden_class: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            view_class_prefix: "ns-view-".into(),
            visible_class: "ns-view-visible".into(),
            hidden_class: "ns-view-hidden".into(),
        }
    }
}

impl Config {
    pub fn view_class_prefix(mut self, prefix: impl Into<String>) -> Config {
        self.view_class_prefix = prefix.into();
        self
    }

    pub fn visible_class(mut self, class: impl Into<String>) -> Config {
        self.visible_class = class.into();
        self
    }

    pub fn hidden_class(mut self, class: impl Into<String>) -> Config {
        self.hidden_class = class.into();
        self
    }

    /// The class identifying a component’s node.
    pub fn view_class(&self, id: &str) -> String {
        format!("{}{}", self.view_class_prefix, id)
    }
}

#[test]
fn test_view_class() {
    assert_eq!(Config::default().view_class("main"), "ns-view-main");
    assert_eq!(Config::default().view_class_prefix("v-").view_class("main"), "v-main");
}
