#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands that update a single session setting; `key` is the settings field
/// the parsed value lands under.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SettingSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub key: &'static str,
}

pub(crate) const TEXT_SETTING_COMMANDS: &[SettingSpec] = &[
    SettingSpec {
        command: "style",
        action: "set_style",
        key: "style",
    },
    SettingSpec {
        command: "model",
        action: "set_model",
        key: "model",
    },
    SettingSpec {
        command: "negative",
        action: "set_negative",
        key: "negative_prompt",
    },
    SettingSpec {
        command: "size",
        action: "set_size",
        key: "size",
    },
];

pub(crate) const NUMERIC_SETTING_COMMANDS: &[SettingSpec] = &[
    SettingSpec {
        command: "guidance",
        action: "set_guidance",
        key: "guidance_scale",
    },
    SettingSpec {
        command: "steps",
        action: "set_steps",
        key: "steps",
    },
];

pub(crate) const TOGGLE_COMMANDS: &[SettingSpec] = &[
    SettingSpec {
        command: "realism",
        action: "set_realism",
        key: "ultra_realism",
    },
    SettingSpec {
        command: "details",
        action: "set_details",
        key: "add_details",
    },
    SettingSpec {
        command: "quality",
        action: "set_quality",
        key: "add_quality",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "history",
        action: "show_history",
    },
    CommandSpec {
        command: "clear",
        action: "clear_history",
    },
    CommandSpec {
        command: "styles",
        action: "list_styles",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub(crate) const REFINE_COMMAND: CommandSpec = CommandSpec {
    command: "refine",
    action: "refine",
};

pub(crate) const SAVE_COMMAND: CommandSpec = CommandSpec {
    command: "save",
    action: "save",
};

pub const SESSION_HELP_COMMANDS: &[&str] = &[
    "/style",
    "/model",
    "/negative",
    "/size",
    "/guidance",
    "/steps",
    "/realism",
    "/details",
    "/quality",
    "/refine",
    "/history",
    "/clear",
    "/save",
    "/styles",
    "/help",
    "/quit",
];
