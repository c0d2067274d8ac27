use pdf_view::controller::Completion;
use pdf_view::{Dispatch, DocumentHandle, Surface, ViewController, ViewHooks};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ViewCommand, ViewUpdate};

/// Channels and task handle for a spawned view worker
pub struct ViewHandle {
    pub command_tx: mpsc::UnboundedSender<ViewCommand>,
    pub update_rx: mpsc::UnboundedReceiver<ViewUpdate>,
    pub task: JoinHandle<()>,
}

/// Spawn a worker task that owns `view` and serves commands until closed
pub fn spawn_view<D, S, H>(view: ViewController<D, S, H>) -> ViewHandle
where
    D: DocumentHandle,
    S: Surface + 'static,
    H: ViewHooks + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(view_task(view, command_rx, update_tx));

    ViewHandle {
        command_tx,
        update_rx,
        task,
    }
}

enum Event {
    Command(Option<ViewCommand>),
    Completed(Option<Completion>),
}

/// Async worker task that applies view commands and reports updates.
///
/// One task owns the view, so commands and render completions are handled
/// one at a time. Commands that arrive while a page is rendering are applied
/// right away and end up in the scheduler's pending slot.
pub async fn view_task<D, S, H>(
    mut view: ViewController<D, S, H>,
    mut command_rx: mpsc::UnboundedReceiver<ViewCommand>,
    update_tx: mpsc::UnboundedSender<ViewUpdate>,
) where
    D: DocumentHandle,
    S: Surface,
    H: ViewHooks,
{
    let _ = update_tx.send(ViewUpdate::Ready {
        page: view.current_page(),
        page_count: view.page_count(),
    });

    loop {
        let event = if view.is_rendering() {
            tokio::select! {
                // Apply queued commands before the drain so only the newest target survives
                biased;
                command = command_rx.recv() => Event::Command(command),
                completion = view.next_completion() => Event::Completed(completion),
            }
        } else {
            Event::Command(command_rx.recv().await)
        };

        match event {
            Event::Command(Some(ViewCommand::Close)) => {
                log::debug!("View closed");
                let _ = update_tx.send(ViewUpdate::Closed);
                return;
            }
            Event::Command(Some(command)) => {
                process_command(command, &mut view, &update_tx).await;
            }
            Event::Command(None) => {
                log::debug!("Command channel closed, stopping view worker");
                return;
            }
            Event::Completed(Some(completion)) => {
                report_completion(completion, view.page_count(), &update_tx);
            }
            Event::Completed(None) => {}
        }
    }
}

async fn process_command<D, S, H>(
    command: ViewCommand,
    view: &mut ViewController<D, S, H>,
    update_tx: &mpsc::UnboundedSender<ViewUpdate>,
) where
    D: DocumentHandle,
    S: Surface,
    H: ViewHooks,
{
    let result = match command {
        ViewCommand::Previous => Ok(view.go_to_previous()),
        ViewCommand::Next => Ok(view.go_to_next()),
        ViewCommand::GoTo { page } => view.go_to_page(page),
        ViewCommand::SetScale { scale } => view.set_scale(scale),
        ViewCommand::Fit { mode } => view.fit(mode).await,
        ViewCommand::Resize { container } => view.resize(container).await,
        ViewCommand::Close => return,
    };

    match result {
        Ok(dispatch) => report_dispatch(dispatch, view.page_count(), update_tx),
        Err(e) => {
            let _ = update_tx.send(ViewUpdate::Error {
                message: e.to_string(),
            });
        }
    }
}

fn report_dispatch(
    dispatch: Dispatch,
    page_count: u32,
    update_tx: &mpsc::UnboundedSender<ViewUpdate>,
) {
    let update = match dispatch {
        Dispatch::Started(request) => ViewUpdate::PageChanged {
            page: request.page,
            page_count,
        },
        Dispatch::Deferred { page } => ViewUpdate::Deferred { page },
        Dispatch::Vetoed { page } => ViewUpdate::Vetoed { page },
        Dispatch::Unchanged => return,
    };
    let _ = update_tx.send(update);
}

fn report_completion(
    completion: Completion,
    page_count: u32,
    update_tx: &mpsc::UnboundedSender<ViewUpdate>,
) {
    let Completion { report, follow_up } = completion;
    let update = match report.result {
        Ok(viewport) => ViewUpdate::Rendered {
            page: report.request.page,
            scale: viewport.scale,
            width: viewport.width,
            height: viewport.height,
        },
        Err(e) => ViewUpdate::RenderFailed {
            page: report.request.page,
            message: e.to_string(),
        },
    };
    let _ = update_tx.send(update);

    if let Some(dispatch) = follow_up {
        report_dispatch(dispatch, page_count, update_tx);
    }
}
