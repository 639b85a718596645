//! Embedded dashboard page
//!
//! A single self-contained page; all data comes from the JSON API so the
//! binary ships without static assets.

use axum::response::Html;

/// GET / - the dashboard page
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>County Socioeconomic Dashboard</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; color: #222; }
  h1 { font-size: 1.4rem; }
  section { margin-bottom: 2rem; }
  label { margin-right: 0.5rem; }
  select { margin-right: 1.5rem; padding: 0.2rem; }
  table { border-collapse: collapse; margin-top: 0.75rem; }
  th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: right; }
  th:first-child, td:first-child { text-align: left; }
  .error { color: #a00; }
</style>
</head>
<body>
<h1>County Socioeconomic Dashboard</h1>

<section>
  <label for="county">County</label>
  <select id="county"></select>
  <label for="scenario-view">View</label>
  <select id="scenario-view">
    <option value="population">Population history</option>
    <option value="scenarios">2065 scenarios</option>
  </select>
  <div id="county-detail"></div>
</section>

<section>
  <h2>Rankings</h2>
  <label for="year">Year</label>
  <select id="year"></select>
  <div id="rankings"></div>
</section>

<script>
const countySelect = document.getElementById('county');
const viewSelect = document.getElementById('scenario-view');
const yearSelect = document.getElementById('year');
const detail = document.getElementById('county-detail');
const rankingsDiv = document.getElementById('rankings');

async function getJSON(url) {
  const response = await fetch(url);
  if (!response.ok) {
    const body = await response.json().catch(() => ({}));
    throw new Error(body.error || response.statusText);
  }
  return response.json();
}

function renderTable(target, rows, columns) {
  if (!rows.length) { target.innerHTML = '<p>No data.</p>'; return; }
  const header = columns.map(c => `<th>${c}</th>`).join('');
  const body = rows.map(row =>
    `<tr>${columns.map(c => `<td>${row[c] ?? ''}</td>`).join('')}</tr>`
  ).join('');
  target.innerHTML = `<table><tr>${header}</tr>${body}</table>`;
}

async function showCounty() {
  const fips = countySelect.value;
  if (!fips) return;
  try {
    if (viewSelect.value === 'population') {
      const data = await getJSON(`/api/counties/${fips}/population`);
      const rows = Object.entries(data.history)
        .filter(([key]) => /^\d{4}$/.test(key))
        .map(([year, population]) => ({ YEAR: year, POPULATION: population }));
      renderTable(detail, rows, ['YEAR', 'POPULATION']);
    } else {
      const data = await getJSON(`/api/scenarios/${fips}`);
      renderTable(detail, data.scenario_indices,
        ['SCENARIO', 'PCT_CHANGE', 'projected_index_balanced',
         'projected_index_employment_focused', 'projected_index_education_focused',
         'projected_index_housing_focused']);
    }
  } catch (err) {
    detail.innerHTML = `<p class="error">${err.message}</p>`;
  }
}

async function showRankings() {
  const year = yearSelect.value;
  if (!year) return;
  try {
    const rows = await getJSON(`/api/rankings?year=${year}`);
    rows.sort((a, b) => a.socioeconomic_index_balanced_rank - b.socioeconomic_index_balanced_rank);
    renderTable(rankingsDiv, rows.slice(0, 50),
      ['NAME', 'socioeconomic_index_balanced_rank', 'socioeconomic_index_economy_focused_rank',
       'socioeconomic_index_safety_focused_rank', 'socioeconomic_index_opportunity_focused_rank']);
  } catch (err) {
    rankingsDiv.innerHTML = `<p class="error">${err.message}</p>`;
  }
}

async function init() {
  try {
    const counties = await getJSON('/api/counties');
    countySelect.innerHTML = counties
      .map(c => `<option value="${c.COUNTY_FIPS}">${c.NAME}</option>`)
      .join('');

    const indices = await getJSON('/api/indices');
    const years = [...new Set(indices.map(row => row.YEAR))].sort();
    yearSelect.innerHTML = years.map(y => `<option>${y}</option>`).join('');
    yearSelect.value = years[years.length - 1];

    await showCounty();
    await showRankings();
  } catch (err) {
    detail.innerHTML = `<p class="error">${err.message}</p>`;
  }
}

countySelect.addEventListener('change', showCounty);
viewSelect.addEventListener('change', showCounty);
yearSelect.addEventListener('change', showRankings);
init();
</script>
</body>
</html>
"#;
