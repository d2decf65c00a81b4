use leptos::prelude::*;

/// 404 - Not Found
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Page not found"</h1>
			<p>"The page you asked for does not exist."</p>
			<a href="/">"Back to the process graph"</a>
		</div>
	}
}
