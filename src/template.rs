//! Script template engine: turns an ExtendScript fragment into a complete,
//! self-contained `.jsx` script.
//!
//! The target engine is ES3-era ExtendScript with no module system and no
//! native JSON, so every script must carry its own helpers. `build` is pure
//! string assembly: helper library, a sentinel line, then the fragment
//! wrapped in a try/catch IIFE whose value is the script's final expression.
//! No I/O, no clock, no randomness; identical fragments produce identical
//! scripts.

/// Premiere's fixed tick rate. All timeline positions on the wire are tick
/// counts; seconds only exist at the API surface.
pub const TICKS_PER_SECOND: u64 = 254_016_000_000;

/// Marks the end of the helper library in every built script. Useful when
/// eyeballing a captured command file: everything above the line is
/// boilerplate, everything below is the actual command.
pub const HELPER_SENTINEL: &str = "// ---- bridge helpers end ----";

/// The ES3 helper library prepended to every built script.
///
/// Contents: tick/time conversion, recursive project-item lookup, clip
/// lookup across a sequence's tracks, a JSON serializer (the engine has no
/// native one), and the envelope constructors every fragment returns
/// through. ES3 only: `var`, no arrow functions, no `JSON`, no `const`.
pub const HELPER_LIB: &str = r##"var TICKS_PER_SECOND = 254016000000;

function ticksToSeconds(ticks) {
    return Number(ticks) / TICKS_PER_SECOND;
}

function secondsToTicks(seconds) {
    return String(Math.round(seconds * TICKS_PER_SECOND));
}

function findProjectItem(item, name) {
    if (!item) { return null; }
    if (item.name === name || item.nodeId === name) { return item; }
    if (item.children) {
        for (var i = 0; i < item.children.numItems; i++) {
            var found = findProjectItem(item.children[i], name);
            if (found) { return found; }
        }
    }
    return null;
}

function findClipById(sequence, clipId) {
    if (!sequence) { return null; }
    var trackGroups = [sequence.videoTracks, sequence.audioTracks];
    for (var g = 0; g < trackGroups.length; g++) {
        var tracks = trackGroups[g];
        if (!tracks) { continue; }
        for (var t = 0; t < tracks.numTracks; t++) {
            var clips = tracks[t].clips;
            for (var c = 0; c < clips.numItems; c++) {
                var clip = clips[c];
                if (clip.nodeId === clipId) { return clip; }
                if (clip.projectItem && clip.projectItem.nodeId === clipId) { return clip; }
            }
        }
    }
    return null;
}

function serializeString(text) {
    var out = '"';
    for (var i = 0; i < text.length; i++) {
        var ch = text.charAt(i);
        var code = text.charCodeAt(i);
        if (ch === '"') { out += '\\"'; }
        else if (ch === '\\') { out += '\\\\'; }
        else if (ch === '\n') { out += '\\n'; }
        else if (ch === '\r') { out += '\\r'; }
        else if (ch === '\t') { out += '\\t'; }
        else if (code < 32) { out += '\\u' + ('000' + code.toString(16)).slice(-4); }
        else { out += ch; }
    }
    return out + '"';
}

function serializeJson(value) {
    if (value === null || value === undefined) { return 'null'; }
    var type = typeof value;
    if (type === 'boolean') { return value ? 'true' : 'false'; }
    if (type === 'number') { return isFinite(value) ? String(value) : 'null'; }
    if (type === 'string') { return serializeString(value); }
    if (value instanceof Array) {
        var parts = [];
        for (var i = 0; i < value.length; i++) {
            parts.push(serializeJson(value[i]));
        }
        return '[' + parts.join(',') + ']';
    }
    if (type === 'object') {
        var fields = [];
        for (var key in value) {
            if (value.hasOwnProperty(key)) {
                fields.push(serializeString(key) + ':' + serializeJson(value[key]));
            }
        }
        return '{' + fields.join(',') + '}';
    }
    return 'null';
}

function bridgeSuccess(data) {
    return '{"success":true,"data":' + serializeJson(data) + '}';
}

function bridgeError(message) {
    return '{"success":false,"error":' + serializeString(String(message)) + '}';
}
"##;

/// Assemble a complete script from a fragment.
///
/// The fragment is used as a function body: end it with a `return` of
/// envelope JSON, normally via `bridgeSuccess`/`bridgeError`. Runtime
/// errors anywhere in the fragment are caught and returned as a failure
/// envelope, so a throwing script still produces a well-formed response.
pub fn build(fragment: &str) -> String {
    format!(
        "{HELPER_LIB}\n{HELPER_SENTINEL}\n(function () {{\n    try {{\n{fragment}\n    }} catch (e) {{\n        return bridgeError(e && e.message ? e.message : String(e));\n    }}\n}})();\n"
    )
}
