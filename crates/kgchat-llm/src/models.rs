/// Known chat models and their context windows.
#[derive(Clone, Debug)]
pub struct ChatModelInfo {
    pub name: &'static str,
    pub context_window: usize,
}

pub static GPT_4_1106_PREVIEW: ChatModelInfo = ChatModelInfo {
    name: "gpt-4-1106-preview",
    context_window: 128_000,
};

pub static GPT_4O: ChatModelInfo = ChatModelInfo {
    name: "gpt-4o",
    context_window: 128_000,
};

pub static GPT_4O_MINI: ChatModelInfo = ChatModelInfo {
    name: "gpt-4o-mini",
    context_window: 128_000,
};

pub static GPT_4: ChatModelInfo = ChatModelInfo {
    name: "gpt-4",
    context_window: 8_192,
};

pub static GPT_35_TURBO: ChatModelInfo = ChatModelInfo {
    name: "gpt-3.5-turbo",
    context_window: 16_385,
};

pub static ALL_MODELS: &[&ChatModelInfo] = &[
    &GPT_4_1106_PREVIEW,
    &GPT_4O,
    &GPT_4O_MINI,
    &GPT_4,
    &GPT_35_TURBO,
];

/// Context window assumed for models missing from the table.
pub const DEFAULT_CONTEXT_WINDOW: usize = 128_000;

pub fn find_model(name: &str) -> Option<&'static ChatModelInfo> {
    ALL_MODELS.iter().find(|m| m.name == name).copied()
}

pub fn context_window_for(name: &str) -> usize {
    find_model(name).map_or(DEFAULT_CONTEXT_WINDOW, |m| m.context_window)
}
