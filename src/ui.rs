use crate::aggregate::ClubRollup;
use maud::{Markup, html};

pub fn render_index(period_label: &str, summary_html: &str) -> String {
    INDEX_HTML
        .replace("{{PERIOD_LABEL}}", &(html! { (period_label) }).into_string())
        .replace("{{SUMMARY}}", summary_html)
}

/// Server-side rendition of the summary cards, matching what the script draws.
pub fn render_summary_cards(rollups: &[ClubRollup]) -> String {
    let markup = html! {
        @if rollups.is_empty() {
            div class="empty-state" {
                h3 { "No data available" }
                p { "Add some results to see your summary" }
            }
        }
        @for club in rollups {
            div class="summary-card" {
                h3 { (club.club_name) }
                div class="summary-stats" {
                    (stat("Total", club.total_result))
                    (stat(&format!("Net of {}%", club.commission_percentage), club.adjusted_total))
                    div class="stat" {
                        span class="label" { "Sessions" }
                        span class="value" { (club.sessions) }
                    }
                    (stat("Average", club.avg_result))
                    (stat("Best", club.best_session))
                    (stat("Worst", club.worst_session))
                }
            }
        }
    };
    markup.into_string()
}

fn stat(label: &str, amount: f64) -> Markup {
    html! {
        div class="stat" {
            span class="label" { (label) }
            span class={ "value " (sign_class(amount)) } { (signed(amount)) }
        }
    }
}

fn signed(amount: f64) -> String {
    format!("{amount:+.2}")
}

fn sign_class(amount: f64) -> &'static str {
    if amount >= 0.0 { "positive" } else { "negative" }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Poker Ledger</title>
  <style>
    :root {
      --bg-1: #10291f;
      --bg-2: #1d4d3a;
      --ink: #1f2624;
      --felt: #2f6b4f;
      --accent: #d9a441;
      --win: #2d7a4b;
      --loss: #c63b2b;
      --card: rgba(255, 255, 255, 0.94);
      --shadow: 0 24px 60px rgba(0, 0, 0, 0.28);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #16382b 60%, #0c1f17 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(980px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.5rem);
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: #5f5c57;
    }

    form.grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(170px, 1fr));
      gap: 12px;
      align-items: end;
    }

    label {
      display: grid;
      gap: 4px;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: #6b645d;
    }

    input, select {
      font: inherit;
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid rgba(0, 0, 0, 0.15);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 11px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--felt);
      color: white;
    }

    button.secondary {
      background: rgba(47, 107, 79, 0.12);
      color: var(--felt);
    }

    button.danger {
      background: var(--loss);
    }

    .toolbar {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      align-items: center;
    }

    .btn-filter.active {
      background: var(--accent);
      color: var(--ink);
    }

    #periodLabel {
      font-weight: 600;
      margin-left: auto;
    }

    .summary-grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 16px;
    }

    .summary-card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(0, 0, 0, 0.08);
    }

    .summary-card h3 {
      margin: 0 0 12px;
    }

    .summary-stats {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 10px;
    }

    .stat .label {
      display: block;
      font-size: 0.72rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.1rem;
      font-weight: 600;
    }

    .positive {
      color: var(--win);
    }

    .negative {
      color: var(--loss);
    }

    .result-item {
      display: flex;
      align-items: center;
      gap: 16px;
      padding: 12px 16px;
      border-radius: 14px;
      background: white;
      border-left: 5px solid var(--win);
      margin-bottom: 8px;
    }

    .result-item.negative {
      border-left-color: var(--loss);
    }

    .result-details {
      flex: 1;
      cursor: pointer;
    }

    .result-details h4, .result-details p {
      margin: 0;
    }

    .result-value {
      font-weight: 700;
      font-size: 1.1rem;
    }

    .empty-state {
      text-align: center;
      color: #6f6a65;
    }

    .modal {
      display: none;
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.45);
      place-items: center;
    }

    .modal.open {
      display: grid;
    }

    .modal-content {
      background: white;
      border-radius: 18px;
      padding: 24px;
      width: min(560px, 92vw);
    }

    .status {
      min-height: 1.2em;
      font-size: 0.95rem;
    }

    .status[data-type="error"] {
      color: var(--loss);
    }

    .status[data-type="ok"] {
      color: var(--win);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    td, th {
      text-align: left;
      padding: 6px 4px;
      border-bottom: 1px solid rgba(0, 0, 0, 0.08);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Poker Ledger</h1>
      <p class="subtitle">Log sessions per club and account, then review results by day, week, month or year.</p>
    </header>

    <section>
      <h2>Add result</h2>
      <form id="resultForm" class="grid">
        <label>Club<input id="clubName" name="clubName" required /></label>
        <label>Account<input id="accountName" name="accountName" required /></label>
        <label>Result<input id="result" name="result" type="number" step="0.01" required /></label>
        <label>Date &amp; time<input id="dateTime" name="dateTime" type="datetime-local" required /></label>
        <button type="submit">Add</button>
      </form>
    </section>

    <section>
      <div class="toolbar">
        <button class="btn-filter active" type="button" data-period="day">Day</button>
        <button class="btn-filter" type="button" data-period="week">Week</button>
        <button class="btn-filter" type="button" data-period="month">Month</button>
        <button class="btn-filter" type="button" data-period="year">Year</button>
        <button class="secondary" type="button" id="prevPeriod">&larr;</button>
        <input id="filterDate" type="date" />
        <button class="secondary" type="button" id="nextPeriod">&rarr;</button>
        <span id="periodLabel">{{PERIOD_LABEL}}</span>
      </div>
    </section>

    <section>
      <h2>Summary</h2>
      <div id="summaryCards" class="summary-grid">{{SUMMARY}}</div>
    </section>

    <section>
      <h2>Results</h2>
      <div id="resultsList"></div>
    </section>

    <section>
      <h2>Commission</h2>
      <form id="commissionForm" class="grid">
        <label>Club<input id="commissionClub" required /></label>
        <label>Percentage<input id="commissionPercentage" type="number" min="0" max="100" step="0.01" required /></label>
        <button type="submit">Save</button>
      </form>
      <table>
        <thead><tr><th>Club</th><th>Commission</th><th></th></tr></thead>
        <tbody id="commissionList"></tbody>
      </table>
    </section>

    <section>
      <h2>Settings &amp; data</h2>
      <form id="settingsForm" class="grid">
        <label>Day starts at
          <select id="dayStartTime"></select>
        </label>
        <label>Week starts on
          <select id="weekStartDay">
            <option value="0">Sunday</option>
            <option value="1">Monday</option>
            <option value="2">Tuesday</option>
            <option value="3">Wednesday</option>
            <option value="4">Thursday</option>
            <option value="5">Friday</option>
            <option value="6">Saturday</option>
          </select>
        </label>
        <button type="submit">Save settings</button>
      </form>
      <p class="toolbar">
        <a href="/api/backup"><button type="button" class="secondary">Download backup</button></a>
      </p>
      <form id="restoreForm" class="grid">
        <label>Restore from backup<input id="backupFile" name="backup" type="file" accept="application/json" required /></label>
        <button type="submit" class="danger">Restore</button>
      </form>
    </section>

    <div class="status" id="status"></div>
  </main>

  <div id="editModal" class="modal">
    <div class="modal-content">
      <h2>Edit result</h2>
      <form id="editForm" class="grid">
        <input type="hidden" id="editId" />
        <label>Club<input id="editClubName" required /></label>
        <label>Account<input id="editAccountName" required /></label>
        <label>Result<input id="editResult" type="number" step="0.01" required /></label>
        <label>Date &amp; time<input id="editDateTime" type="datetime-local" required /></label>
        <button type="submit">Save</button>
        <button type="button" class="danger" id="deleteResult">Delete</button>
        <button type="button" class="secondary" id="closeModal">Cancel</button>
      </form>
    </div>
  </div>

  <script>
    const $ = (id) => document.getElementById(id);
    const statusEl = $('status');

    const localDate = (d) => [
      d.getFullYear(),
      String(d.getMonth() + 1).padStart(2, '0'),
      String(d.getDate()).padStart(2, '0')
    ].join('-');

    const state = {
      period: 'day',
      date: localDate(new Date()),
      tags: { results: null, summary: null },
      results: []
    };

    const esc = (value) => String(value)
      .replace(/&/g, '&amp;')
      .replace(/</g, '&lt;')
      .replace(/>/g, '&gt;')
      .replace(/"/g, '&quot;')
      .replace(/'/g, '&#39;');

    const signed = (value) => `${value >= 0 ? '+' : ''}${value.toFixed(2)}`;
    const signClass = (value) => (value >= 0 ? 'positive' : 'negative');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
      if (type === 'ok') {
        setTimeout(() => setStatus('', ''), 2000);
      }
    };

    const loadSettings = () => {
      const stored = JSON.parse(localStorage.getItem('poker_settings') || '{}');
      return {
        dayStartTime: stored.dayStartTime || '00:00',
        weekStartDay: stored.weekStartDay === undefined ? '1' : String(stored.weekStartDay)
      };
    };

    const query = () => {
      const settings = loadSettings();
      const params = new URLSearchParams({
        period: state.period,
        date: state.date,
        dayStartTime: settings.dayStartTime,
        weekStartDay: settings.weekStartDay
      });
      return params.toString();
    };

    const toLocalInput = (iso) => {
      const date = new Date(iso);
      date.setMinutes(date.getMinutes() - date.getTimezoneOffset());
      return date.toISOString().slice(0, 16);
    };

    const api = async (url, options = {}) => {
      const res = await fetch(url, options);
      if (!res.ok && res.status !== 304) {
        const body = await res.json().catch(() => ({}));
        throw new Error(body.error || `Request failed (${res.status})`);
      }
      return res;
    };

    // Conditional fetch: a 304 means the rendered view is already current.
    const fetchIfChanged = async (key, url) => {
      const headers = state.tags[key] ? { 'If-None-Match': state.tags[key] } : {};
      const res = await api(url, { headers });
      if (res.status === 304) {
        return null;
      }
      state.tags[key] = res.headers.get('ETag');
      return res.json();
    };

    const renderResults = (results) => {
      state.results = results;
      const container = $('resultsList');
      if (!results.length) {
        container.innerHTML = '<div class="empty-state"><h3>No results found</h3><p>Add your first poker result to get started</p></div>';
        return;
      }
      container.innerHTML = results.map((r) => `
        <div class="result-item ${signClass(r.result)}">
          <div class="result-details" data-fill="${r.id}">
            <h4>${esc(r.club_name)} - ${esc(r.account_name)}</h4>
            <p>${new Date(r.date_time).toLocaleString()}</p>
          </div>
          <div class="result-value ${signClass(r.result)}">${signed(r.result)}</div>
          <button type="button" class="secondary" data-edit="${r.id}">Edit</button>
        </div>`).join('');
    };

    const renderSummary = (summary) => {
      const container = $('summaryCards');
      if (!summary.length) {
        container.innerHTML = '<div class="empty-state"><h3>No data available</h3><p>Add some results to see your summary</p></div>';
        return;
      }
      const stat = (label, value, cls) =>
        `<div class="stat"><span class="label">${label}</span><span class="value ${cls || ''}">${value}</span></div>`;
      container.innerHTML = summary.map((club) => `
        <div class="summary-card">
          <h3>${esc(club.club_name)}</h3>
          <div class="summary-stats">
            ${stat('Total', signed(club.total_result), signClass(club.total_result))}
            ${stat(`Net of ${club.commission_percentage}%`, signed(club.adjusted_total), signClass(club.adjusted_total))}
            ${stat('Sessions', club.sessions)}
            ${stat('Average', signed(club.avg_result), signClass(club.avg_result))}
            ${stat('Best', signed(club.best_session), signClass(club.best_session))}
            ${stat('Worst', signed(club.worst_session), signClass(club.worst_session))}
          </div>
        </div>`).join('');
    };

    const loadPeriod = async () => {
      const res = await api(`/api/period?${query()}`);
      const period = await res.json();
      $('periodLabel').textContent = `${period.local_start.replace('T', ' ')} → ${period.local_end.replace('T', ' ')}`;
      $('prevPeriod').dataset.date = period.previous;
      $('nextPeriod').dataset.date = period.next;
    };

    const loadResults = async () => {
      const results = await fetchIfChanged('results', `/api/results?${query()}`);
      if (results) {
        renderResults(results);
      }
    };

    const loadSummary = async () => {
      const summary = await fetchIfChanged('summary', `/api/summary?${query()}`);
      if (summary) {
        renderSummary(summary);
      }
    };

    const loadCommissions = async () => {
      const res = await api('/api/commissions');
      const rates = await res.json();
      $('commissionList').innerHTML = rates.map((rate) => `
        <tr>
          <td>${esc(rate.club_name)}</td>
          <td>${rate.commission_percentage}%</td>
          <td><button type="button" class="secondary" data-remove-commission="${esc(rate.club_name)}">Remove</button></td>
        </tr>`).join('');
    };

    const refresh = async () => {
      $('filterDate').value = state.date;
      await Promise.all([loadPeriod(), loadResults(), loadSummary()]);
    };

    const rememberLabels = (club, account) => {
      const clubs = JSON.parse(localStorage.getItem('poker_clubs') || '[]');
      const accounts = JSON.parse(localStorage.getItem('poker_accounts') || '[]');
      if (!clubs.includes(club)) {
        clubs.push(club);
        localStorage.setItem('poker_clubs', JSON.stringify(clubs));
      }
      if (!accounts.includes(account)) {
        accounts.push(account);
        localStorage.setItem('poker_accounts', JSON.stringify(accounts));
      }
      loadAutocomplete();
    };

    const loadAutocomplete = () => {
      const clubs = JSON.parse(localStorage.getItem('poker_clubs') || '[]');
      const accounts = JSON.parse(localStorage.getItem('poker_accounts') || '[]');
      [['clubName', clubs], ['editClubName', clubs], ['commissionClub', clubs], ['accountName', accounts], ['editAccountName', accounts]]
        .forEach(([inputId, options]) => {
          const input = $(inputId);
          let list = $(`${inputId}_datalist`);
          if (!list) {
            list = document.createElement('datalist');
            list.id = `${inputId}_datalist`;
            input.parentNode.appendChild(list);
            input.setAttribute('list', list.id);
          }
          list.innerHTML = options.map((option) => `<option value="${esc(option)}"></option>`).join('');
        });
    };

    $('resultForm').addEventListener('submit', async (event) => {
      event.preventDefault();
      const body = {
        club_name: $('clubName').value,
        account_name: $('accountName').value,
        result: parseFloat($('result').value),
        date_time: new Date($('dateTime').value).toISOString()
      };
      try {
        await api('/api/results', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(body)
        });
        rememberLabels(body.club_name.trim(), body.account_name.trim());
        $('result').value = '';
        $('dateTime').value = toLocalInput(new Date().toISOString());
        setStatus('Result added', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('editForm').addEventListener('submit', async (event) => {
      event.preventDefault();
      const body = {
        club_name: $('editClubName').value,
        account_name: $('editAccountName').value,
        result: parseFloat($('editResult').value),
        date_time: new Date($('editDateTime').value).toISOString()
      };
      try {
        await api(`/api/results/${$('editId').value}`, {
          method: 'PUT',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(body)
        });
        $('editModal').classList.remove('open');
        setStatus('Result updated', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('deleteResult').addEventListener('click', async () => {
      if (!confirm('Are you sure you want to delete this result?')) {
        return;
      }
      try {
        await api(`/api/results/${$('editId').value}`, { method: 'DELETE' });
        $('editModal').classList.remove('open');
        setStatus('Result deleted', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('closeModal').addEventListener('click', () => $('editModal').classList.remove('open'));

    $('resultsList').addEventListener('click', (event) => {
      const edit = event.target.closest('[data-edit]');
      const target = edit || event.target.closest('[data-fill]');
      if (!target) {
        return;
      }
      const id = Number(target.dataset.edit || target.dataset.fill);
      const record = state.results.find((r) => r.id === id);
      if (!record) {
        return;
      }
      if (edit) {
        $('editId').value = record.id;
        $('editClubName').value = record.club_name;
        $('editAccountName').value = record.account_name;
        $('editResult').value = record.result;
        $('editDateTime').value = toLocalInput(record.date_time);
        $('editModal').classList.add('open');
      } else {
        $('clubName').value = record.club_name;
        $('accountName').value = record.account_name;
        $('result').focus();
      }
    });

    document.querySelectorAll('.btn-filter').forEach((button) => {
      button.addEventListener('click', () => {
        document.querySelectorAll('.btn-filter').forEach((b) => b.classList.remove('active'));
        button.classList.add('active');
        state.period = button.dataset.period;
        refresh().catch((err) => setStatus(err.message, 'error'));
      });
    });

    ['prevPeriod', 'nextPeriod'].forEach((id) => {
      $(id).addEventListener('click', () => {
        if ($(id).dataset.date) {
          state.date = $(id).dataset.date;
          refresh().catch((err) => setStatus(err.message, 'error'));
        }
      });
    });

    $('filterDate').addEventListener('change', (event) => {
      state.date = event.target.value;
      refresh().catch((err) => setStatus(err.message, 'error'));
    });

    $('commissionForm').addEventListener('submit', async (event) => {
      event.preventDefault();
      const club = $('commissionClub').value.trim();
      try {
        await api(`/api/commissions/${encodeURIComponent(club)}`, {
          method: 'PUT',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ commission_percentage: parseFloat($('commissionPercentage').value) })
        });
        setStatus('Commission saved', 'ok');
        await Promise.all([loadCommissions(), loadSummary()]);
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('commissionList').addEventListener('click', async (event) => {
      const button = event.target.closest('[data-remove-commission]');
      if (!button) {
        return;
      }
      try {
        await api(`/api/commissions/${encodeURIComponent(button.dataset.removeCommission)}`, { method: 'DELETE' });
        await Promise.all([loadCommissions(), loadSummary()]);
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('settingsForm').addEventListener('submit', (event) => {
      event.preventDefault();
      localStorage.setItem('poker_settings', JSON.stringify({
        dayStartTime: $('dayStartTime').value,
        weekStartDay: $('weekStartDay').value
      }));
      setStatus('Settings saved', 'ok');
      refresh().catch((err) => setStatus(err.message, 'error'));
    });

    $('restoreForm').addEventListener('submit', async (event) => {
      event.preventDefault();
      if (!confirm('Restoring replaces every stored result. Continue?')) {
        return;
      }
      const form = new FormData();
      form.append('backup', $('backupFile').files[0]);
      try {
        const res = await api('/api/restore', { method: 'POST', body: form });
        const body = await res.json();
        setStatus(`${body.message} (${body.restored_records} records)`, 'ok');
        await Promise.all([refresh(), loadCommissions()]);
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    const init = () => {
      const hours = [];
      for (let h = 0; h < 24; h += 1) {
        const value = `${String(h).padStart(2, '0')}:00`;
        hours.push(`<option value="${value}">${value}</option>`);
      }
      $('dayStartTime').innerHTML = hours.join('');
      const settings = loadSettings();
      $('dayStartTime').value = settings.dayStartTime;
      $('weekStartDay').value = settings.weekStartDay;
      $('dateTime').value = toLocalInput(new Date().toISOString());
      loadAutocomplete();
      Promise.all([refresh(), loadCommissions()]).catch((err) => setStatus(err.message, 'error'));
    };

    init();
  </script>
</body>
</html>
"#;
