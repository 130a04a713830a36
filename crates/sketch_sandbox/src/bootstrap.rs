//! String-templated isolation bootstrap.
//!
//! The composed document is self-contained: it loads the p5.js library,
//! wraps the `window.p5` entry point so the constructed instance is captured
//! into a well-known slot, evaluates the sketch code under a guard, and
//! relays any runtime fault both to an in-document panel and to the host
//! bridge as a JSON line.

/// Default p5.js library location baked into composed documents.
pub const DEFAULT_P5_LIB_URL: &str = "https://cdn.jsdelivr.net/npm/p5@1.11.3/lib/p5.min.js";

const CODE_MARKER: &str = "/*__SKETCH_CODE__*/";
const LIB_URL_MARKER: &str = "__P5_LIB_URL__";
const TITLE_MARKER: &str = "__DOCUMENT_TITLE__";

const DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__DOCUMENT_TITLE__</title>
<style>
  html, body { margin: 0; padding: 0; }
  #sketch-fault-panel {
    position: fixed;
    left: 0;
    right: 0;
    bottom: 0;
    padding: 8px 12px;
    background: #7f1d1d;
    color: #fecaca;
    font: 12px monospace;
    white-space: pre-wrap;
    z-index: 9999;
  }
</style>
<script src="__P5_LIB_URL__"></script>
</head>
<body>
<div id="sketch-fault-panel" hidden></div>
<script>
(function () {
  "use strict";

  function showFault(message) {
    var text = String(message);
    var panel = document.getElementById("sketch-fault-panel");
    if (panel) {
      panel.hidden = false;
      panel.textContent = text;
    }
    try {
      if (window.__sketch_host && typeof window.__sketch_host.report === "function") {
        window.__sketch_host.report(JSON.stringify({ message: text }));
      }
    } catch (ignored) {
      /* the fault panel already carries the message */
    }
  }

  window.addEventListener("error", function (event) {
    showFault(event.message || event.error || "Unknown script error");
  });
  window.addEventListener("unhandledrejection", function (event) {
    showFault(event.reason || "Unhandled promise rejection");
  });

  var RealP5 = window.p5;
  var wrapped = typeof RealP5 === "function";
  window.__sketch_instance = null;

  if (wrapped) {
    window.p5 = function () {
      var bound = Function.prototype.bind.apply(
        RealP5,
        [null].concat(Array.prototype.slice.call(arguments))
      );
      var instance = new bound();
      window.__sketch_instance = instance;
      return instance;
    };
    window.p5.prototype = RealP5.prototype;
  } else {
    console.warn("p5 entry point unavailable at injection time; skipping the capture override");
  }

  window.__sketch_pause = function () {
    var instance = window.__sketch_instance;
    if (instance && typeof instance.noLoop === "function") {
      instance.noLoop();
    } else {
      console.warn("pause requested before a sketch instance was captured");
    }
  };
  window.__sketch_resume = function () {
    var instance = window.__sketch_instance;
    if (instance && typeof instance.loop === "function") {
      instance.loop();
    } else {
      console.warn("resume requested before a sketch instance was captured");
    }
  };

  try {
    eval(document.getElementById("sketch-source").textContent);
  } catch (error) {
    showFault(error && error.message ? error.message : error);
  } finally {
    if (wrapped) {
      window.p5 = RealP5;
    }
  }
})();
</script>
<script type="text/plain" id="sketch-source">/*__SKETCH_CODE__*/</script>
</body>
</html>
"#;

/// Knobs for document composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOptions {
    pub p5_lib_url: String,
    pub title: String,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            p5_lib_url: DEFAULT_P5_LIB_URL.to_string(),
            title: "Sketch".to_string(),
        }
    }
}

impl BootstrapOptions {
    #[must_use]
    pub fn with_p5_lib_url(mut self, url: impl Into<String>) -> Self {
        self.p5_lib_url = url.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Composes a complete standalone document around one code version.
///
/// The code is embedded verbatim apart from `</script` sequences, which are
/// broken up so embedded markup cannot terminate the carrier element early.
#[must_use]
pub fn compose_document(code: &str, options: &BootstrapOptions) -> String {
    DOCUMENT_TEMPLATE
        .replace(TITLE_MARKER, &escape_html_text(&options.title))
        .replace(LIB_URL_MARKER, &options.p5_lib_url)
        .replace(CODE_MARKER, &escape_script_content(code))
}

fn escape_script_content(code: &str) -> String {
    code.replace("</script", r"<\/script")
}

fn escape_html_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
