pub const TRACE_VIEW_STYLES: &str = r#"
.trace-view {
    display: flex;
    flex-direction: column;
    height: 100%;
    color: var(--text-primary, #e5e7eb);
    background: var(--bg-primary, #0b1120);
    font-family: ui-sans-serif, system-ui, sans-serif;
}

.trace-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    gap: 0.6rem;
    padding: 0.5rem 0.75rem;
    border-bottom: 1px solid var(--border-color, #334155);
}

.trace-title {
    margin: 0;
    font-size: 1rem;
}

.trace-subtitle {
    font-size: 0.72rem;
    color: var(--text-secondary, #9ca3af);
}

.trace-header-actions {
    display: flex;
    align-items: center;
    gap: 0.45rem;
    flex-wrap: wrap;
}

.trace-btn {
    background: color-mix(in srgb, var(--bg-primary, #0b1120) 75%, #2563eb 25%);
    border: 1px solid color-mix(in srgb, var(--border-color, #334155) 50%, #2563eb 50%);
    color: var(--text-primary, #e5e7eb);
    border-radius: 0.45rem;
    padding: 0.32rem 0.55rem;
    font-size: 0.72rem;
    cursor: pointer;
}

.trace-btn:hover {
    background: color-mix(in srgb, var(--bg-primary, #0b1120) 65%, #2563eb 35%);
}

.trace-btn:disabled {
    opacity: 0.5;
    cursor: default;
}

.trace-metrics {
    display: flex;
    gap: 0.35rem;
    flex-wrap: wrap;
    padding: 0.45rem 0.75rem;
}

.trace-pill {
    font-size: 0.7rem;
    border-radius: 999px;
    padding: 0.12rem 0.5rem;
    border: 1px solid var(--border-color, #334155);
    color: var(--text-secondary, #9ca3af);
}

.trace-pill--running { color: #f59e0b; border-color: #f59e0b; }
.trace-pill--completed { color: #16a34a; border-color: #16a34a; }
.trace-pill--failed { color: #ef4444; border-color: #ef4444; }

.trace-banner {
    margin: 0.5rem 0.75rem;
    padding: 0.45rem 0.6rem;
    border-radius: 0.45rem;
    font-size: 0.75rem;
    background: color-mix(in srgb, #ef4444 15%, transparent);
    border: 1px solid color-mix(in srgb, #ef4444 45%, transparent);
}

.trace-body {
    display: grid;
    grid-template-columns: minmax(0, 3fr) minmax(16rem, 2fr);
    gap: 0.75rem;
    padding: 0.5rem 0.75rem 0.75rem;
    flex: 1;
    min-height: 0;
}

.trace-tree {
    overflow: auto;
    border: 1px solid var(--border-color, #334155);
    border-radius: 10px;
    padding: 0.3rem 0;
}

.span-row {
    display: flex;
    align-items: center;
    gap: 0.4rem;
    padding: 0.22rem 0.5rem;
    font-size: 0.78rem;
    cursor: pointer;
    border-left: 3px solid transparent;
}

.span-row:hover {
    background: color-mix(in srgb, var(--bg-secondary, #111827) 70%, #2563eb 30%);
}

.span-row--critical {
    border-left-color: #f97316;
}

.span-row--critical .span-name {
    color: #fdba74;
    font-weight: 600;
}

.span-row--selected {
    background: color-mix(in srgb, var(--bg-secondary, #111827) 55%, #2563eb 45%);
}

.span-toggle {
    width: 1rem;
    background: none;
    border: none;
    color: inherit;
    cursor: pointer;
    padding: 0;
}

.span-toggle--leaf {
    visibility: hidden;
}

.span-glyph {
    width: 1rem;
    text-align: center;
    color: var(--text-secondary, #9ca3af);
}

.span-name {
    flex: 1;
    white-space: nowrap;
    overflow: hidden;
    text-overflow: ellipsis;
}

.span-metric {
    font-variant-numeric: tabular-nums;
    color: var(--text-secondary, #9ca3af);
    font-size: 0.72rem;
}

.span-status {
    font-size: 0.68rem;
    text-transform: uppercase;
}

.span-status--running { color: #f59e0b; }
.span-status--completed { color: #16a34a; }
.span-status--failed { color: #ef4444; }

.trace-side {
    display: flex;
    flex-direction: column;
    gap: 0.75rem;
    overflow: auto;
}

.trace-card {
    border: 1px solid var(--border-color, #334155);
    border-radius: 10px;
    background: color-mix(in srgb, var(--bg-secondary, #111827) 86%, #0b1225 14%);
    padding: 0.7rem;
}

.trace-card h3 {
    margin: 0 0 0.45rem 0;
    font-size: 0.85rem;
}

.trace-kv {
    display: grid;
    grid-template-columns: auto 1fr;
    gap: 0.2rem 0.6rem;
    font-size: 0.74rem;
}

.trace-kv dt {
    color: var(--text-secondary, #9ca3af);
}

.trace-kv dd {
    margin: 0;
    word-break: break-all;
}

.trace-pre {
    font-size: 0.7rem;
    white-space: pre-wrap;
    max-height: 12rem;
    overflow: auto;
    background: var(--bg-primary, #0b1120);
    border-radius: 6px;
    padding: 0.4rem;
}

.bottleneck-row {
    display: grid;
    grid-template-columns: 1fr auto auto;
    gap: 0.5rem;
    font-size: 0.74rem;
    padding: 0.2rem 0;
    cursor: pointer;
}

.bottleneck-bar {
    grid-column: 1 / -1;
    height: 3px;
    border-radius: 2px;
    background: #2563eb;
}

.bottleneck-row--critical .bottleneck-bar {
    background: #f97316;
}

.empty-state {
    padding: 2rem;
    text-align: center;
    color: var(--text-secondary, #9ca3af);
}
"#;
