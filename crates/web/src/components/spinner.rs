//! Busy indicator shown while the session is being established

use yew::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpinnerSize {
    /// Fits inside a button or navbar
    Inline,
    #[default]
    Page,
}

impl SpinnerSize {
    const fn ring_classes(self) -> &'static str {
        match self {
            Self::Inline => "w-4 h-4 border-2",
            Self::Page => "w-10 h-10 border-4",
        }
    }

    const fn wrapper_classes(self) -> &'static str {
        match self {
            Self::Inline => "inline-flex items-center gap-2",
            Self::Page => "flex flex-col items-center justify-center gap-4 p-10",
        }
    }
}

#[derive(Properties, Clone, PartialEq)]
pub struct SpinnerProps {
    #[prop_or_default]
    pub text: Option<String>,
    #[prop_or_default]
    pub size: SpinnerSize,
}

#[function_component(LoadingSpinner)]
pub fn loading_spinner(props: &SpinnerProps) -> Html {
    let ring = classes!(
        props.size.ring_classes(),
        "border-gray-200",
        "border-t-indigo-500",
        "rounded-full",
        "animate-spin"
    );

    html! {
        <div class={props.size.wrapper_classes()} role="status" aria-live="polite">
            <span class={ring} aria-hidden="true"></span>
            <span class={if props.text.is_some() { "text-gray-600 text-sm" } else { "sr-only" }}>
                {props.text.clone().unwrap_or_else(|| "Loading".to_string())}
            </span>
        </div>
    }
}
