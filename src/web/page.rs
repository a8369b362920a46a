use html_escape::{encode_safe, encode_text};

use crate::core::model::ExamplePair;

/// Render the single demo page. The example gallery is baked in server-side
/// from the catalog; everything else is wired up by the page script.
pub fn render_page(catalog: &[ExamplePair]) -> String {
    let gallery = if catalog.is_empty() {
        "<p class='empty'>No examples available.</p>".to_string()
    } else {
        let mut cards = String::new();
        for (index, pair) in catalog.iter().enumerate() {
            cards.push_str(&format!(
                "<button type='button' class='example' data-index='{index}' data-reference='{reference}'>\
                 <img src='/api/examples/{index}/image' alt='{name}' loading='lazy'/>\
                 <span>{label}</span></button>",
                index = index,
                reference = encode_safe(&pair.reference),
                name = encode_safe(&pair.name()),
                label = encode_text(&pair.name()),
            ));
        }
        cards
    };

    format!("{PAGE_PREFIX}{gallery}{PAGE_SUFFIX}")
}

const PAGE_PREFIX: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>Handwritten Text Recognition Demo</title>
<style>
body { margin: 0 auto; max-width: 960px; padding: 20px; font-family: Arial, sans-serif; color: #222; }
h1 { text-align: center; }
.intro { color: #555; }
.panels { display: flex; gap: 20px; flex-wrap: wrap; }
.panel { flex: 1 1 320px; border: 1px solid #ddd; border-radius: 6px; padding: 15px; }
.panel label { display: block; margin: 10px 0 4px; font-weight: bold; }
#preview { max-width: 100%; border: 1px solid #eee; margin-top: 10px; }
textarea, input[type='text'] { width: 100%; box-sizing: border-box; padding: 6px; }
.buttons { margin-top: 15px; display: flex; gap: 10px; }
button { padding: 8px 16px; cursor: pointer; }
#submit { background: #2563eb; color: #fff; border: none; border-radius: 4px; }
#clear { background: #eee; border: 1px solid #ccc; border-radius: 4px; }
details { margin-top: 20px; }
#gallery { display: flex; gap: 10px; flex-wrap: wrap; margin-top: 10px; }
.example { border: 1px solid #ddd; border-radius: 4px; background: #fafafa; padding: 6px; max-width: 220px; }
.example img { max-width: 200px; display: block; }
.example span { font-size: 12px; color: #555; }
.empty { color: #888; }
</style>
</head>
<body>
<h1>Handwritten Text Recognition Demo</h1>
<p class='intro'>Upload a scanned handwritten line image or pick one of the
examples below. The line is normalized and sent to the external decoder; if
you provide the ground truth, the character error rate of the transcription
is reported next to it.</p>
<div class='panels'>
<div class='panel'>
<label for='file-input'>Input image:</label>
<input type='file' id='file-input' accept='image/*'/>
<img id='preview' alt='input preview' hidden/>
<div class='buttons'>
<button type='button' id='clear'>Clear</button>
<button type='button' id='submit'>Submit</button>
</div>
</div>
<div class='panel'>
<label for='output'>Generated text:</label>
<input type='text' id='output' readonly/>
<label for='ground-truth'>Ground truth:</label>
<textarea id='ground-truth' rows='3' placeholder='Provide the ground truth, if available.'></textarea>
<label for='cer'>CER:</label>
<input type='text' id='cer' readonly/>
</div>
</div>
<details>
<summary>Choose an example from the test set:</summary>
<div id='gallery'>
"#;

const PAGE_SUFFIX: &str = r#"</div>
</details>
<script>
const fileInput = document.getElementById('file-input');
const preview = document.getElementById('preview');
const output = document.getElementById('output');
const groundTruth = document.getElementById('ground-truth');
const cerBox = document.getElementById('cer');
let selectedExample = null;

for (const el of document.querySelectorAll('.example')) {
  el.addEventListener('click', () => {
    selectedExample = el.dataset.index;
    fileInput.value = '';
    preview.src = '/api/examples/' + selectedExample + '/image';
    preview.hidden = false;
    groundTruth.value = el.dataset.reference;
    output.value = '';
    cerBox.value = '';
  });
}

fileInput.addEventListener('change', () => {
  if (fileInput.files.length > 0) {
    selectedExample = null;
    preview.src = URL.createObjectURL(fileInput.files[0]);
    preview.hidden = false;
  }
});

document.getElementById('submit').addEventListener('click', async () => {
  const form = new FormData();
  if (fileInput.files.length > 0) {
    form.append('image', fileInput.files[0]);
  } else if (selectedExample !== null) {
    form.append('example', selectedExample);
  } else {
    output.value = 'Choose an image first.';
    return;
  }
  form.append('ground_truth', groundTruth.value);
  try {
    const reply = await fetch('/api/recognize', { method: 'POST', body: form });
    const data = await reply.json();
    if (data.success) {
      output.value = data.text;
      cerBox.value = (data.cer !== undefined && data.cer !== null)
        ? data.cer.toFixed(3)
        : data.cer_status;
    } else {
      output.value = data.error;
      cerBox.value = '';
    }
  } catch (err) {
    output.value = 'Request failed: ' + err;
    cerBox.value = '';
  }
});

document.getElementById('clear').addEventListener('click', () => {
  fileInput.value = '';
  selectedExample = null;
  preview.src = '';
  preview.hidden = true;
  groundTruth.value = '';
  output.value = '';
  cerBox.value = '';
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pair(name: &str, reference: &str) -> ExamplePair {
        ExamplePair {
            image_path: PathBuf::from(format!("/data/{name}")),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn page_contains_all_widgets() {
        let html = render_page(&[]);
        for id in ["file-input", "preview", "output", "ground-truth", "cer"] {
            assert!(html.contains(&format!("id='{id}'")), "missing widget {id}");
        }
        assert!(html.contains("id='submit'"));
        assert!(html.contains("id='clear'"));
    }

    #[test]
    fn gallery_lists_one_card_per_pair() {
        let html = render_page(&[
            pair("line_01.jpg", "first"),
            pair("line_02.jpg", "second"),
        ]);
        assert_eq!(html.matches("class='example'").count(), 2);
        assert!(html.contains("/api/examples/0/image"));
        assert!(html.contains("/api/examples/1/image"));
    }

    #[test]
    fn reference_text_is_escaped() {
        let html = render_page(&[pair("line_01.jpg", "<script>alert('x')</script>")]);
        assert!(!html.contains("data-reference='<script>"));
    }

    #[test]
    fn empty_catalog_shows_placeholder() {
        let html = render_page(&[]);
        assert!(html.contains("No examples available."));
    }
}
