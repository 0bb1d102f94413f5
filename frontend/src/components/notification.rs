use std::rc::Rc;

use gloo_timers::callback::Timeout;
use yew::prelude::*;

use crate::config::TOAST_LIFETIME_MS;
use crate::contact::sanitize::sanitize;
use crate::network::NetworkErrorReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn error(message: &str) -> Self {
        Self {
            kind: ToastKind::Error,
            message: sanitize(message),
        }
    }

    pub fn success(message: &str) -> Self {
        Self {
            kind: ToastKind::Success,
            message: sanitize(message),
        }
    }
}

pub enum ToastAction {
    Push(u32, Toast),
    Dismiss(u32),
}

#[derive(Default, PartialEq)]
pub struct ToastList {
    items: Vec<(u32, Toast)>,
}

impl Reducible for ToastList {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut items = self.items.clone();
        match action {
            ToastAction::Push(id, toast) => items.push((id, toast)),
            ToastAction::Dismiss(id) => items.retain(|(existing, _)| *existing != id),
        }
        Rc::new(Self { items })
    }
}

/// Handed out through context so any component can raise a toast.
#[derive(Clone, PartialEq)]
pub struct Notifier(Callback<Toast>);

impl Notifier {
    pub fn notify(&self, toast: Toast) {
        self.0.emit(toast);
    }
}

impl NetworkErrorReporter for Notifier {
    fn report(&self, message: &str) {
        self.notify(Toast::error(message));
    }
}

#[derive(Properties, PartialEq)]
pub struct ToastProviderProps {
    pub children: Children,
}

#[function_component(ToastProvider)]
pub fn toast_provider(props: &ToastProviderProps) -> Html {
    let toasts = use_reducer(ToastList::default);
    let next_id = use_mut_ref(|| 0u32);

    let notifier = {
        let toasts = toasts.dispatcher();
        Notifier(Callback::from(move |toast: Toast| {
            let id = {
                let mut next = next_id.borrow_mut();
                *next = next.wrapping_add(1);
                *next
            };
            toasts.dispatch(ToastAction::Push(id, toast));
            let toasts = toasts.clone();
            Timeout::new(TOAST_LIFETIME_MS, move || {
                toasts.dispatch(ToastAction::Dismiss(id));
            })
            .forget();
        }))
    };

    html! {
        <ContextProvider<Notifier> context={notifier}>
            { props.children.clone() }
            <div class="fixed top-4 right-4 z-50 max-w-md">
                { for toasts.items.iter().map(|(id, toast)| {
                    let (colors, icon) = match toast.kind {
                        ToastKind::Error => ("bg-red-100 text-red-700", "fas fa-exclamation-circle"),
                        ToastKind::Success => ("bg-green-100 text-green-700", "fas fa-check-circle"),
                    };
                    html! {
                        <div key={*id} class={classes!("p-4", "mb-4", "rounded-lg", "shadow-lg", colors)}>
                            <div class="flex items-center">
                                <i class={classes!(icon, "mr-2")}></i>
                                <p>{ &toast.message }</p>
                            </div>
                        </div>
                    }
                }) }
            </div>
        </ContextProvider<Notifier>>
    }
}
