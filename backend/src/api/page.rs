//! The single form page served at `/`.
//!
//! Plain HTML plus a small script: the preview is fetched from
//! `/api/preview` and rendered as a read-only table; the download button
//! posts the same form to `/api/export`.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Deducciones IVA</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
  label { display: block; margin: 1rem 0 .25rem; font-weight: 600; }
  input[type=text] { width: 100%; padding: .4rem; }
  .msg { padding: .75rem; border-radius: 4px; margin: 1rem 0; }
  .info { background: #e8f0fe; } .error { background: #fde8e8; } .warning { background: #fff4e5; }
  table { border-collapse: collapse; width: 100%; margin-top: 1rem; font-size: .9rem; }
  th, td { border: 1px solid #ddd; padding: .3rem .5rem; }
  td.num { text-align: right; } tr.total td { font-weight: 700; }
  button { margin-top: 1rem; padding: .5rem 1rem; }
</style>
</head>
<body>
<h1>📊 Deducciones IVA</h1>
<form id="form" method="post" action="/api/export" enctype="multipart/form-data">
  <label for="contribuyente">Nombre del Contribuyente</label>
  <input type="text" id="contribuyente" name="contribuyente">
  <label for="file">Selecciona el archivo Excel descargado desde mis retenciones en ARCA</label>
  <input type="file" id="file" name="file" accept=".xlsx,.xls">
  <div>
    <button type="button" id="preview">Procesar</button>
    <button type="submit" id="download" disabled>📥 Descargar Excel</button>
  </div>
</form>
<div id="status" class="msg info">Por favor, ingresa el nombre del contribuyente y selecciona un archivo Excel para comenzar.</div>
<div id="result"></div>
<script>
const form = document.getElementById('form');
const status = document.getElementById('status');
const result = document.getElementById('result');
const download = document.getElementById('download');

function show(kind, text) { status.className = 'msg ' + kind; status.textContent = text; }
function esc(s) { const d = document.createElement('div'); d.textContent = s; return d.innerHTML; }

async function runPreview() {
  result.innerHTML = '';
  download.disabled = true;
  const res = await fetch('/api/preview', { method: 'POST', body: new FormData(form) });
  const body = await res.json();
  if (body.status === 'prompt') { show(body.message.includes('selecciona') ? 'info' : 'error', body.message); return; }
  if (body.status === 'error') { show('error', body.error); return; }

  const p = body.preview;
  show(body.status === 'warning' ? 'warning' : 'info',
       body.status === 'warning' ? body.warnings.join('\n') : p.subtitle);
  let html = '<h3>Vista de los datos:</h3><p>Total de registros: ' + p.recordCount + '</p><table><tr>';
  html += p.columns.map(c => '<th>' + esc(c) + '</th>').join('') + '</tr>';
  for (const row of p.rows) {
    html += '<tr' + (row.isTotal ? ' class="total"' : '') + '>';
    html += row.cells.map((c, i) => '<td' + (i === 5 ? ' class="num"' : '') + '>' + esc(c) + '</td>').join('');
    html += '</tr>';
  }
  html += '</table><h3>Información del archivo:</h3>';
  html += '<p>Número de filas: ' + p.recordCount + '<br>Número de columnas: ' + p.columnCount + '</p>';
  html += '<h3>Columnas disponibles:</h3><p>' + p.columns.map(esc).join(', ') + '</p>';
  result.innerHTML = html;
  download.disabled = false;
}

document.getElementById('preview').addEventListener('click', () => runPreview().catch(e => show('error', String(e))));
form.addEventListener('input', () => { download.disabled = true; });
</script>
</body>
</html>
"#;
