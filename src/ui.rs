use crate::tracker::TrackerSnapshot;

pub fn render_index(snapshot: &TrackerSnapshot) -> String {
    let state = &snapshot.state;
    let summary = &snapshot.summary;
    INDEX_HTML
        .replace("{{DATE}}", &state.window.date.to_string())
        .replace("{{CURRENT}}", &summary.current_ml.to_string())
        .replace("{{GOAL}}", &summary.goal_ml.to_string())
        .replace("{{PROGRESS}}", &format!("{:.0}", summary.display_progress))
        .replace("{{REMAINING}}", &summary.remaining_ml.to_string())
        .replace("{{AMOUNT}}", &state.drink_amount_ml.to_string())
        .replace("{{NEXT_DRINK}}", &summary.next_drink.label())
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta name="theme-color" content="#1f7fb8" />
  <title>Water Intake Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef7fb;
      --bg-2: #bfe3f2;
      --ink: #1d2b33;
      --accent: #1f7fb8;
      --accent-2: #2f4858;
      --ok: #2d7a4b;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(31, 127, 184, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3f2f8 60%, #f4fafc 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(920px, 100%);
      display: grid;
      gap: 22px;
      animation: rise 600ms ease;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 14px;
      font-size: 1.2rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: #5a6a73;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
      gap: 22px;
    }

    .card {
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    .big {
      font-size: 2.2rem;
      font-weight: 600;
      color: var(--accent);
    }

    .bar {
      height: 16px;
      border-radius: 999px;
      background: rgba(31, 127, 184, 0.12);
      overflow: hidden;
      margin: 14px 0 10px;
    }

    .bar > div {
      height: 100%;
      background: linear-gradient(90deg, #5bc0eb, var(--accent));
      transition: width 300ms ease;
    }

    .row {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
      margin: 10px 0;
    }

    button, select, input {
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-weight: 600;
      cursor: pointer;
      background: rgba(47, 72, 88, 0.1);
      color: var(--accent-2);
      transition: transform 150ms ease;
    }

    button:active {
      transform: scale(0.98);
    }

    button.primary {
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(31, 127, 184, 0.3);
      width: 100%;
    }

    button.on {
      background: var(--ok);
      color: white;
    }

    input, select {
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 12px;
      padding: 8px 10px;
      width: 110px;
      text-align: center;
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      max-height: 220px;
      overflow-y: auto;
    }

    li {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 8px 0;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    li button {
      padding: 4px 10px;
      font-size: 0.85rem;
    }

    .badge {
      padding: 4px 10px;
      border-radius: 999px;
      font-size: 0.8rem;
      background: #fff4c2;
      color: #7a5b00;
    }

    .badge[data-state="granted"] {
      background: #d8f3e0;
      color: var(--ok);
    }

    .badge[data-state="denied"] {
      background: #fbdcd7;
      color: #c63b2b;
    }

    #chart {
      width: 100%;
      height: 220px;
      display: block;
    }

    .chart-bar {
      fill: #5bc0eb;
    }

    .chart-bar.met {
      fill: var(--ok);
    }

    .chart-goal {
      stroke: #c63b2b;
      stroke-dasharray: 4 6;
    }

    .chart-label {
      fill: #6a7880;
      font-size: 11px;
    }

    .status {
      min-height: 1.2em;
      color: #5a6a73;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: var(--ok);
    }

    .hidden {
      display: none;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Water Intake Tracker</h1>
        <p class="subtitle">Today: <span id="date">{{DATE}}</span></p>
      </div>
      <button id="install-btn" class="hidden" type="button">Install app</button>
    </header>

    <section class="grid">
      <div class="card">
        <h2>Today's intake</h2>
        <div><span class="big" id="current">{{CURRENT}}</span> / <span id="goal">{{GOAL}}</span> ml</div>
        <div class="bar"><div id="progress-bar" style="width: {{PROGRESS}}%"></div></div>
        <div class="row">
          <span><span id="progress">{{PROGRESS}}</span>% reached</span>
          <span><span id="remaining">{{REMAINING}}</span> ml to go</span>
        </div>
      </div>

      <div class="card">
        <h2>Drink water</h2>
        <div class="row">
          <button id="dec-btn" type="button">-20</button>
          <span class="big"><span id="amount">{{AMOUNT}}</span> ml</span>
          <button id="inc-btn" type="button">+20</button>
        </div>
        <form id="add-form" method="post" action="/water/add">
          <button class="primary" type="submit">Log a drink</button>
        </form>
        <p class="subtitle">Next drink: <strong id="next-drink">{{NEXT_DRINK}}</strong></p>
      </div>
    </section>

    <section class="grid">
      <div class="card">
        <h2>Today's records</h2>
        <ul id="records"></ul>
        <p class="subtitle" id="records-empty">No drinks logged yet.</p>
      </div>

      <div class="card">
        <h2>Settings</h2>
        <div class="row">
          <span>Daily goal</span>
          <span><input id="goal-input" type="number" min="100" max="20000" step="100" value="{{GOAL}}" /> ml</span>
        </div>
      </div>
    </section>

    <section class="card">
      <h2>Last 7 days</h2>
      <svg id="chart" viewBox="0 0 600 220" aria-label="Weekly intake" role="img"></svg>
      <p class="subtitle">Average <span id="average">0</span> ml, goal met on <span id="goal-days">0</span> of 7 days.</p>
    </section>

    <section class="grid">
      <div class="card">
        <h2>Reminders</h2>
        <div class="row">
          <span>Desktop notifications</span>
          <span class="badge" id="permission" data-state="default">not set</span>
        </div>
        <div class="row">
          <span>Reminder</span>
          <button id="toggle-btn" type="button">OFF</button>
        </div>
        <div class="row">
          <span>Interval</span>
          <select id="interval">
            <option value="15">15 min</option>
            <option value="30">30 min</option>
            <option value="60">1 hour</option>
            <option value="90">1 h 30 min</option>
            <option value="120">2 hours</option>
          </select>
        </div>
        <p class="subtitle" id="next-alarm"></p>
      </div>

      <div class="card">
        <h2>App</h2>
        <p class="subtitle" id="install-status">Open this page in a supporting browser to install it.</p>
      </div>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const $ = (id) => document.getElementById(id);
    const statusEl = $('status');
    const shown = new Map();
    const answered = new Set();
    let deferredPrompt = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const request = async (method, url, body) => {
      const options = { method, headers: {} };
      if (body !== undefined) {
        options.headers['content-type'] = 'application/json';
        options.body = JSON.stringify(body);
      }
      const res = await fetch(url, options);
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    const permissionLabels = { granted: 'allowed', denied: 'blocked', default: 'not set' };

    const updateUI = (data) => {
      $('date').textContent = data.date;
      $('current').textContent = data.current_intake_ml;
      $('goal').textContent = data.daily_goal_ml;
      $('progress').textContent = Math.round(data.display_progress);
      $('progress-bar').style.width = `${data.display_progress}%`;
      $('remaining').textContent = data.remaining_ml;
      $('amount').textContent = data.drink_amount_ml;
      $('next-drink').textContent = data.next_drink;
      if (document.activeElement !== $('goal-input')) {
        $('goal-input').value = data.daily_goal_ml;
      }

      const list = $('records');
      list.innerHTML = '';
      data.records.forEach((record) => {
        const item = document.createElement('li');
        item.innerHTML = `<span>${record.time}</span><span>${record.amount_ml} ml</span>`;
        const remove = document.createElement('button');
        remove.type = 'button';
        remove.textContent = 'Remove';
        remove.addEventListener('click', () => {
          request('DELETE', `/api/records/${record.id}`)
            .then(refresh)
            .catch((err) => setStatus(err.message, 'error'));
        });
        item.appendChild(remove);
        list.appendChild(item);
      });
      $('records-empty').classList.toggle('hidden', data.records.length > 0);

      const permission = $('permission');
      permission.dataset.state = data.notification_permission;
      permission.textContent = permissionLabels[data.notification_permission] || data.notification_permission;

      const toggle = $('toggle-btn');
      toggle.textContent = data.reminder.enabled ? 'ON' : 'OFF';
      toggle.classList.toggle('on', data.reminder.enabled);
      $('interval').value = String(data.reminder.interval_minutes);
      $('next-alarm').textContent = data.reminder.enabled && data.reminder.next_fire_at
        ? `Next reminder at ${data.reminder.next_fire_at}`
        : '';

      $('install-btn').classList.toggle('hidden', !(data.installable && deferredPrompt));
    };

    const renderChart = (weekly) => {
      const chart = $('chart');
      const width = 600;
      const height = 220;
      const bottom = 190;
      const top = 20;
      const goal = weekly.days.length ? weekly.days[0].goal_ml : 0;
      const max = Math.max(goal, ...weekly.days.map((day) => day.intake_ml), 1);
      const slot = width / weekly.days.length;
      const scale = (value) => bottom - (value / max) * (bottom - top);

      let svg = '';
      weekly.days.forEach((day, index) => {
        const x = index * slot + slot * 0.2;
        const y = scale(day.intake_ml);
        svg += `<rect class="chart-bar${day.goal_met ? ' met' : ''}" x="${x}" y="${y}" width="${slot * 0.6}" height="${bottom - y}" rx="6"></rect>`;
        svg += `<text class="chart-label" x="${index * slot + slot / 2}" y="${height - 10}" text-anchor="middle">${day.label}</text>`;
      });
      const goalY = scale(goal);
      svg += `<line class="chart-goal" x1="0" x2="${width}" y1="${goalY}" y2="${goalY}"></line>`;
      chart.innerHTML = svg;

      $('average').textContent = Math.round(weekly.average_ml);
      $('goal-days').textContent = weekly.days_goal_met;
    };

    const loadToday = async () => updateUI(await request('GET', '/api/today'));
    const loadWeekly = async () => renderChart(await request('GET', '/api/weekly'));

    const refresh = async () => {
      await Promise.all([loadToday(), loadWeekly()]);
    };

    const showNotification = (pending) => {
      const notification = new Notification(pending.title, { body: pending.body, tag: pending.tag });
      notification.onclick = (event) => {
        event.preventDefault();
        window.focus();
        request('POST', `/api/notifications/${pending.id}`, { interaction: 'click' })
          .then(refresh)
          .catch(() => {});
        notification.close();
      };
      notification.onclose = () => {
        if (shown.has(pending.id)) {
          shown.delete(pending.id);
          request('POST', `/api/notifications/${pending.id}`, { interaction: 'close' }).catch(() => {});
        }
      };
      shown.set(pending.id, notification);
    };

    const poll = async () => {
      const pending = await request('GET', '/api/pending');
      const live = new Set(pending.notifications.map((n) => n.id));

      for (const [id, notification] of shown) {
        if (!live.has(id)) {
          shown.delete(id);
          notification.close();
        }
      }

      pending.notifications.forEach((n) => {
        if (!shown.has(n.id) && 'Notification' in window && Notification.permission === 'granted') {
          showNotification(n);
        }
      });

      for (const prompt of pending.prompts) {
        if (answered.has(prompt.id)) continue;
        answered.add(prompt.id);
        const accepted = window.confirm(prompt.message);
        await request('POST', `/api/prompts/${prompt.id}`, { accepted }).catch(() => {});
        if (accepted) await refresh();
      }
    };

    const reportPermission = async () => {
      if (!('Notification' in window)) return;
      let permission = Notification.permission;
      if (permission === 'default') {
        permission = await Notification.requestPermission();
      }
      await request('POST', '/api/permission', { permission });
    };

    $('add-form').addEventListener('submit', (event) => {
      event.preventDefault();
      request('POST', '/api/water')
        .then((data) => {
          updateUI(data);
          setStatus('Saved', 'ok');
          setTimeout(() => setStatus('', ''), 1200);
          return loadWeekly();
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    const stepAmount = (action) => {
      request('POST', '/api/drink-amount', { action })
        .then(updateUI)
        .catch((err) => setStatus(err.message, 'error'));
    };
    $('dec-btn').addEventListener('click', () => stepAmount('decrease'));
    $('inc-btn').addEventListener('click', () => stepAmount('increase'));

    $('goal-input').addEventListener('change', (event) => {
      const value = Number(event.target.value);
      request('PUT', '/api/settings', { daily_goal_ml: value })
        .then(refresh)
        .catch((err) => setStatus(err.message, 'error'));
    });

    $('toggle-btn').addEventListener('click', () => {
      request('POST', '/api/reminder/toggle')
        .then(loadToday)
        .catch((err) => setStatus(err.message, 'error'));
    });

    $('interval').addEventListener('change', (event) => {
      request('PUT', '/api/settings', { interval_minutes: Number(event.target.value) })
        .then(loadToday)
        .catch((err) => setStatus(err.message, 'error'));
    });

    window.addEventListener('beforeinstallprompt', (event) => {
      event.preventDefault();
      deferredPrompt = event;
      $('install-status').textContent = 'This app can be installed.';
      request('POST', '/api/install', { event: 'available' }).then(loadToday).catch(() => {});
    });

    window.addEventListener('appinstalled', () => {
      deferredPrompt = null;
      $('install-status').textContent = 'Installed.';
      request('POST', '/api/install', { event: 'installed' }).then(loadToday).catch(() => {});
    });

    $('install-btn').addEventListener('click', async () => {
      if (!deferredPrompt) return;
      await deferredPrompt.prompt();
      const choice = await deferredPrompt.userChoice;
      if (choice.outcome === 'accepted') deferredPrompt = null;
      request('POST', '/api/install', { event: choice.outcome }).then(loadToday).catch(() => {});
    });

    reportPermission()
      .catch(() => {})
      .finally(() => refresh().catch((err) => setStatus(err.message, 'error')));
    setInterval(() => poll().catch(() => {}), 5000);
    setInterval(() => loadToday().catch(() => {}), 60000);
  </script>
</body>
</html>
"##;
