// Cross-cutting prompt fragments shared by every LLM-backed component.
// Component-specific prompts live next to the component (see structuring/prompts.rs).

/// Appended to every system prompt whose caller parses the reply with `call_json`.
pub const JSON_ONLY_SYSTEM: &str = "Reply with one JSON object and nothing else. \
    No markdown code fences, no commentary before or after the object, no apologies. \
    Use exactly the keys you were asked for; never add keys and never omit keys.";
